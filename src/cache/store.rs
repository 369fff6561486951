//! Cache Store Module
//!
//! Bounded counter storage with TTL expiration and FIFO-by-creation eviction.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// Bounded map of counters keyed by resource id.
///
/// Every mutating method completes without suspending, so callers holding the
/// store behind a lock never expose a half-evicted or half-inserted state.
#[derive(Debug)]
pub struct CacheStore {
    /// Counter storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Lifetime of every entry in milliseconds
    ttl_ms: u64,
    /// Next insertion sequence number
    next_seq: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_size` entries, each living `ttl_ms`.
    ///
    /// A `max_size` of 0 is raised to 1.
    pub fn new(max_size: usize, ttl_ms: u64) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(max_size, ttl_ms),
            max_size,
            ttl_ms,
            next_seq: 0,
        }
    }

    // == Get ==
    /// Looks up a counter against the wall clock.
    pub fn get(&mut self, key: &str) -> Option<u64> {
        self.get_at(key, current_timestamp_ms())
    }

    /// Looks up a counter as of `now`.
    ///
    /// Returns the value while `now <= expires_at`. A stale entry is removed
    /// and reported as a miss.
    pub fn get_at(&mut self, key: &str, now: u64) -> Option<u64> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value;
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                self.stats.set_size(self.entries.len());
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores a counter stamped with the wall clock.
    pub fn put(&mut self, key: String, value: u64) {
        self.put_at(key, value, current_timestamp_ms());
    }

    /// Stores a counter inserted at `now`.
    ///
    /// An existing key is replaced wholesale. A new key arriving at capacity
    /// first evicts the single oldest-created entry.
    pub fn put_at(&mut self, key: String, value: u64, now: u64) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let mut entry = CacheEntry::new(value, now, self.ttl_ms);
        entry.seq = self.next_seq;
        self.next_seq += 1;

        self.entries.insert(key, entry);
        self.stats.set_size(self.entries.len());
    }

    // == Evict Oldest ==
    /// Removes the entry with the smallest `inserted_at`.
    ///
    /// Reads never refresh an entry's position: this is creation order, not
    /// recency of use.
    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&oldest);
        self.stats.record_eviction();
        debug!(key = %oldest, "evicted oldest counter");
        Some(oldest)
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_size(0);
    }

    // == Sweep ==
    /// Removes every entry with `expires_at < now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        self.stats.set_size(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    /// Returns the entry for `key` without checking expiry or touching stats.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}
