//! Error types for the counter cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Why a counter could not be retrieved from upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}")]
    Status { status: u16 },

    /// Payload was not a usable counter
    #[error("Parse error: {0}")]
    Parse(String),

    /// The fetch task panicked or was cancelled by the runtime
    #[error("Fetch aborted: {0}")]
    Aborted(String),
}

// == API Error Enum ==
/// Errors surfaced by the HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP API.
pub type Result<T> = std::result::Result<T, ApiError>;
