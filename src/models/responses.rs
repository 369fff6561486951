//! Response DTOs for the counter cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Response body for the single counter operation (GET /counts/:id)
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub id: String,
    pub count: u64,
}

impl CountResponse {
    pub fn new(id: impl Into<String>, count: u64) -> Self {
        Self {
            id: id.into(),
            count,
        }
    }
}

/// Response body for the batch operation (POST /counts)
#[derive(Debug, Clone, Serialize)]
pub struct CountsResponse {
    /// Counters that resolved
    pub counts: HashMap<String, u64>,
    /// Requested ids that could not be resolved, in request order
    pub missing: Vec<String>,
}

impl CountsResponse {
    /// Builds the response, listing each requested id absent from `counts` once.
    pub fn new(requested: &[String], counts: HashMap<String, u64>) -> Self {
        let mut listed: HashSet<&str> = HashSet::new();
        let missing = requested
            .iter()
            .filter(|id| !counts.contains_key(id.as_str()) && listed.insert(id.as_str()))
            .cloned()
            .collect();
        Self { counts, missing }
    }
}

/// Response body for the clear operation (DELETE /counts)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Counter cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
