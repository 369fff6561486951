//! Cache Entry Module
//!
//! Defines a single memoized counter with its creation and expiry time.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A memoized counter value.
///
/// Entries are immutable once created: a `put` for the same key replaces the
/// whole entry rather than updating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cached counter
    pub value: u64,
    /// Creation timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Store-wide insertion sequence, breaks ties on `inserted_at`
    pub(crate) seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry inserted at `now` that lives for `ttl_ms`.
    pub fn new(value: u64, now: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            expires_at: now.saturating_add(ttl_ms),
            seq: 0,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// An entry is still fresh at exactly `expires_at`; it becomes stale one
    /// millisecond later. Both lazy reads and the sweeper use this boundary.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch yields 0 instead of panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
