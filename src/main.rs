// Impact Lab - HTTP server binary

#[tokio::main]
async fn main() {
    impactlab_lib::run().await
}
