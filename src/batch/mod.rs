//! Batch Module
//!
//! Resolves many counters at once: cache hits first, then misses fetched in
//! sequential chunks of bounded concurrency, written through to the store.

mod coordinator;

pub use coordinator::{CounterService, CounterStats, SharedStore};

/// Default number of fetches in flight for one batch
pub const DEFAULT_CONCURRENCY: usize = 5;
