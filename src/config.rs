//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::batch::DEFAULT_CONCURRENCY;
use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL_MS};
use crate::tasks::DEFAULT_SWEEP_INTERVAL_MS;

const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8080/api/counts";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SERVER_PORT: u16 = 3000;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lifetime of a cached counter in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of cached counters
    pub max_size: usize,
    /// Fetches in flight per batch when the caller does not choose
    pub batch_concurrency: usize,
    /// Interval between expiry sweeps in milliseconds
    pub sweep_interval_ms: u64,
    /// Base URL counters are fetched from
    pub upstream_url: String,
    /// Per-request upstream timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Counter lifetime (default: 300000)
    /// - `CACHE_MAX_SIZE` - Maximum cached counters (default: 1000)
    /// - `BATCH_CONCURRENCY` - Default fetches in flight per batch (default: 5)
    /// - `SWEEP_INTERVAL_MS` - Expiry sweep frequency (default: 60000)
    /// - `UPSTREAM_URL` - Counter endpoint base URL
    /// - `FETCH_TIMEOUT_MS` - Upstream request timeout (default: 10000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_ms: env_or("CACHE_TTL_MS", defaults.ttl_ms),
            max_size: env_or("CACHE_MAX_SIZE", defaults.max_size),
            batch_concurrency: env_or("BATCH_CONCURRENCY", defaults.batch_concurrency),
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            max_size: DEFAULT_MAX_SIZE,
            batch_concurrency: DEFAULT_CONCURRENCY,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
