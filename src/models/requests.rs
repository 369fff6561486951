//! Request DTOs for the counter cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;

/// Maximum number of ids accepted in one batch request
pub const MAX_BATCH_IDS: usize = 1000;

/// Maximum concurrency a client may ask for
pub const MAX_CONCURRENCY: usize = 64;

/// Request body for the batch operation (POST /counts)
///
/// # Fields
/// - `ids`: Resource ids whose counters are wanted
/// - `concurrency`: Optional cap on fetches in flight (service default if absent)
#[derive(Debug, Clone, Deserialize)]
pub struct CountsRequest {
    pub ids: Vec<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl CountsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.ids.is_empty() {
            return Some("ids cannot be empty".to_string());
        }
        if self.ids.len() > MAX_BATCH_IDS {
            return Some(format!(
                "Batch exceeds maximum of {} ids",
                MAX_BATCH_IDS
            ));
        }
        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                return Some(format!(
                    "concurrency must be between 1 and {}",
                    MAX_CONCURRENCY
                ));
            }
        }
        self.ids.iter().find_map(|id| validate_id(id))
    }
}

/// Validates a single resource id.
///
/// Returns an error message if the id is empty or too long.
pub fn validate_id(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("Id cannot be empty".to_string());
    }
    if id.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Id exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
