// Error Types - Failure taxonomy shared by the API surface and upstream clients
// The impact core itself is total and never returns these.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum ImpactLabError {
    /// Missing or non-finite request field; nothing is computed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream JSON parsed but did not carry the fields we need.
    #[error("malformed upstream response: {0}")]
    MalformedUpstream(String),

    #[error("upstream returned status {status}")]
    Upstream { status: u16, message: Option<String> },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ImpactLabError>;

impl ImpactLabError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ImpactLabError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ImpactLabError::NotFound(_) => StatusCode::NOT_FOUND,
            ImpactLabError::MalformedUpstream(_)
            | ImpactLabError::Upstream { .. }
            | ImpactLabError::Transport(_) => StatusCode::BAD_GATEWAY,
            ImpactLabError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ImpactLabError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
