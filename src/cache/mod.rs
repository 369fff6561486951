//! Cache Module
//!
//! Provides bounded in-memory counter caching with TTL expiration and
//! FIFO-by-creation eviction.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default lifetime of a cached counter (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Default maximum number of cached counters
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Maximum allowed id length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
