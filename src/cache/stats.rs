//! Cache Statistics Module
//!
//! Tracks cache performance metrics and the introspection triple
//! (size, max size, cache duration).

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub size: usize,
    /// Capacity of the cache
    pub max_size: usize,
    /// TTL applied to every entry, in milliseconds
    pub cache_duration_ms: u64,
    /// Number of lookups answered from the cache
    pub hits: u64,
    /// Number of lookups that found nothing fresh
    pub misses: u64,
    /// Number of entries removed to stay within capacity
    pub evictions: u64,
    /// Number of stale entries removed by reads or sweeps
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates stats for a store of the given shape with all counters at zero.
    pub fn new(max_size: usize, cache_duration_ms: u64) -> Self {
        Self {
            max_size,
            cache_duration_ms,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}
