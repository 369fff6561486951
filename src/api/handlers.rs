//! API Handlers
//!
//! HTTP request handlers for each counter cache endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::batch::{CounterService, CounterStats};
use crate::error::{ApiError, Result};
use crate::models::{
    validate_id, ClearResponse, CountResponse, CountsRequest, CountsResponse, HealthResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub counters: CounterService,
}

impl AppState {
    pub fn new(counters: CounterService) -> Self {
        Self { counters }
    }
}

/// Handler for GET /counts/:id
///
/// Always answers with a count; upstream failures read as 0.
pub async fn count_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CountResponse>> {
    if let Some(error_msg) = validate_id(&id) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let count = state.counters.get_count(&id).await;
    Ok(Json(CountResponse::new(id, count)))
}

/// Handler for POST /counts
///
/// Returns the counters that resolved and lists the ids that did not.
pub async fn counts_handler(
    State(state): State<AppState>,
    Json(req): Json<CountsRequest>,
) -> Result<Json<CountsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let concurrency = req
        .concurrency
        .unwrap_or_else(|| state.counters.default_concurrency());
    let counts = state.counters.get_counts(&req.ids, concurrency).await;

    Ok(Json(CountsResponse::new(&req.ids, counts)))
}

/// Handler for DELETE /counts
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.counters.clear().await;
    Json(ClearResponse::new())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CounterStats> {
    Json(state.counters.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
