// Server - HTTP surface for the impact lab
// Thin axum handlers over AppState; all computation lives in the domain modules.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::asteroid_catalog::AsteroidRecord;
use crate::config::Config;
use crate::error::{ImpactLabError, Result};
use crate::state_manager::{
    AppState, ApproachFeed, CatalogQuery, CatalogResponse, FeedQuery, OrbitResponse,
    SimulationRequest, SimulationResult,
};

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/simulate", post(simulate))
        .route("/api/asteroids", get(list_asteroids))
        .route("/api/asteroids/{id}", get(get_asteroid))
        .route("/api/asteroids/{id}/orbit", get(get_orbit))
        .route("/api/feed", get(approach_feed))
        .with_state(state)
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[tracing::instrument(skip_all)]
async fn simulate(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<Json<SimulationResult>> {
    // Malformed bodies share the 400 envelope with field validation.
    let Json(request) = payload.map_err(|e| ImpactLabError::InvalidInput(e.body_text()))?;
    let result = state.run_simulation(request).await?;
    Ok(Json(result))
}

#[tracing::instrument(skip(state))]
async fn list_asteroids(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    Json(state.list_asteroids(query).await)
}

#[tracing::instrument(skip(state))]
async fn get_asteroid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AsteroidRecord>> {
    Ok(Json(state.get_asteroid(&id).await?))
}

#[derive(Debug, Deserialize)]
struct OrbitQuery {
    /// Julian date to propagate to; defaults to now
    jd: Option<f64>,
}

#[tracing::instrument(skip(state))]
async fn get_orbit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OrbitQuery>,
) -> Result<Json<OrbitResponse>> {
    Ok(Json(state.get_orbit(&id, query.jd).await?))
}

#[tracing::instrument(skip(state))]
async fn approach_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApproachFeed>> {
    Ok(Json(state.approaches(query).await?))
}

// =============================================================================
// ENTRY POINT
// =============================================================================

pub async fn run() {
    init_tracing();
    let config = Config::from_env();
    let addr = config.bind_addr;

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise application state");
            return;
        }
    };
    tracing::info!(
        presets = state.fallback.records().len(),
        aliases = state.aliases.len(),
        nasa = state.neows.is_some(),
        "catalog ready"
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return;
        }
    };
    tracing::info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!(error = %e, "server error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    fn build_test_app() -> Router {
        let state = AppState::new(Config::default()).expect("expected embedded catalog");
        app(Arc::new(state))
    }

    async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("expected request to build")
    }

    fn post_json(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("expected request to build")
    }

    #[tokio::test]
    async fn when_health_is_called_then_returns_ok() {
        let response = build_test_app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn when_simulating_an_ocean_impact_then_returns_full_result() {
        let request = post_json(
            "/api/simulate",
            r#"{"location":{"lat":30.0,"lng":-45.0},"diameter":500,"velocity":20,
                "angle":45,"density":3000,"terrain":"water"}"#,
        );
        let response = build_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert!(payload["impact"]["energyMt"].as_f64().unwrap() > 0.0);
        assert!(payload["tsunami"]["runupHeight"].as_f64().unwrap() > 0.0);
        assert_eq!(payload["footprints"].as_array().unwrap().len(), 6);
        assert_eq!(payload["footprints"][0]["type"], "crater");
        assert_eq!(payload["population"]["source"], "heuristic");
        assert!(payload["summary"].as_str().unwrap().contains("tsunami"));
    }

    #[tokio::test]
    async fn when_simulation_lacks_location_then_returns_400_and_error_message() {
        let request = post_json(
            "/api/simulate",
            r#"{"diameter":500,"velocity":20,"angle":45,"density":3000,"terrain":"land"}"#,
        );
        let response = build_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "invalid input: location is required"
        );
    }

    #[tokio::test]
    async fn when_simulation_body_is_not_json_then_returns_400() {
        let response = build_test_app()
            .oneshot(post_json("/api/simulate", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn when_listing_hazardous_asteroids_then_only_hazardous_are_returned() {
        let response = build_test_app()
            .oneshot(get_request("/api/asteroids?hazardous=true&pageSize=50"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["source"], "fallback");
        assert_eq!(payload["filters"]["hazardousOnly"], true);
        let asteroids = payload["asteroids"].as_array().unwrap();
        assert!(!asteroids.is_empty());
        assert!(asteroids.iter().all(|a| a["hazardous"] == true));
    }

    #[tokio::test]
    async fn when_fetching_asteroid_by_alias_then_returns_record() {
        let response = build_test_app()
            .oneshot(get_request("/api/asteroids/Apophis"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], "2099942");
    }

    #[tokio::test]
    async fn when_asteroid_id_is_an_encoded_path_then_returns_400() {
        let response = build_test_app()
            .oneshot(get_request("/api/asteroids/..%2F..%2F..%2Fplanetary%2Fapod"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn when_asteroid_is_unknown_then_returns_404() {
        let response = build_test_app()
            .oneshot(get_request("/api/asteroids/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn when_fetching_orbit_then_returns_position() {
        let response = build_test_app()
            .oneshot(get_request("/api/asteroids/2101955/orbit?jd=2460600.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["object"]["name"], "Bennu");
        assert_eq!(payload["position"]["julianDate"], 2460600.5);
        assert!(payload["position"]["position"]["radius"].as_f64().unwrap() > 0.8);
    }

    #[tokio::test]
    async fn when_requesting_approach_feed_offline_then_uses_presets() {
        let response = build_test_app()
            .oneshot(get_request("/api/feed?start=2029-04-10&end=2029-04-16"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["source"], "fallback");
        assert_eq!(payload["asteroids"][0]["name"], "Apophis");
    }

    #[tokio::test]
    async fn when_route_does_not_exist_then_returns_404() {
        let response = build_test_app()
            .oneshot(get_request("/api/does-not-exist"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
