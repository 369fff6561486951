//! Counter Cache - A bounded TTL cache for externally sourced counters
//!
//! Memoizes integer counters fetched from upstream, refreshes many of them at
//! once under a concurrency cap, and tolerates per-item failure.

pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use batch::CounterService;
pub use config::Config;
pub use error::FetchError;
pub use fetch::{Fetcher, HttpFetcher};
pub use tasks::{Sweeper, SweeperHandle};
