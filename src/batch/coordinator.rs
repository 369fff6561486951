//! Counter Service
//!
//! Coordinates cache lookups and bounded-concurrency backfill from a
//! [`Fetcher`].
//!
//! # Known race
//! A lookup and the write of its fetched value are separated by the fetch
//! itself. Two concurrent requests for the same missing id can therefore both
//! fetch it. Both writes replace the entry wholesale, so the only cost is the
//! redundant upstream call.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::DEFAULT_CONCURRENCY;
use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::Fetcher;

/// Store handle shared by the service and its sweeper.
pub type SharedStore = Arc<RwLock<CacheStore>>;

#[derive(Debug, Default)]
struct FetchMetrics {
    fetches: AtomicU64,
    failures: AtomicU64,
}

// == Counter Stats ==
/// Store statistics plus upstream fetch counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub hit_rate: f64,
    /// Fetches issued to upstream
    pub fetches: u64,
    /// Fetches that failed or aborted
    pub fetch_failures: u64,
    pub default_concurrency: usize,
}

// == Counter Service ==
/// Entry point for reading counters through the cache.
///
/// Cloning is cheap; clones share the same store and fetcher.
#[derive(Clone)]
pub struct CounterService {
    store: SharedStore,
    fetcher: Arc<dyn Fetcher>,
    default_concurrency: usize,
    metrics: Arc<FetchMetrics>,
}

impl CounterService {
    // == Constructor ==
    /// Creates a service owning `store` and reading misses from `fetcher`.
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            fetcher,
            default_concurrency: DEFAULT_CONCURRENCY,
            metrics: Arc::new(FetchMetrics::default()),
        }
    }

    /// Creates a service with the store shape and concurrency from `config`.
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let store = CacheStore::new(config.max_size, config.ttl_ms);
        Self::new(store, fetcher).with_default_concurrency(config.batch_concurrency)
    }

    /// Overrides the concurrency used by [`get_counts_default`](Self::get_counts_default).
    pub fn with_default_concurrency(mut self, concurrency: usize) -> Self {
        self.default_concurrency = concurrency.max(1);
        self
    }

    /// Returns the shared store, e.g. to hand to a [`Sweeper`](crate::tasks::Sweeper).
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn default_concurrency(&self) -> usize {
        self.default_concurrency
    }

    // == Resolve Counts ==
    /// Resolves every distinct id to its outcome.
    ///
    /// Hits are answered from the store. Misses are fetched in consecutive
    /// chunks of at most `concurrency` ids; a chunk starts only after every
    /// fetch of the previous one has settled. A failure never cancels its
    /// siblings or later chunks. `concurrency` of 0 is treated as 1.
    ///
    /// Each fetch runs as its own task and writes its value to the store
    /// before settling, so the cache is warmed even if this future is dropped.
    pub async fn resolve_counts(
        &self,
        ids: &[String],
        concurrency: usize,
    ) -> HashMap<String, Result<u64, FetchError>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        let mut results = HashMap::with_capacity(unique.len());
        let mut misses = Vec::new();
        {
            let mut store = self.store.write().await;
            for id in unique {
                match store.get(id) {
                    Some(value) => {
                        results.insert(id.clone(), Ok(value));
                    }
                    None => misses.push(id.clone()),
                }
            }
        }

        if misses.is_empty() {
            return results;
        }

        let concurrency = concurrency.max(1);
        debug!(
            hits = results.len(),
            misses = misses.len(),
            concurrency,
            "backfilling counters"
        );

        let mut failed = 0usize;
        for chunk in misses.chunks(concurrency) {
            let handles: Vec<_> = chunk.iter().map(|id| self.spawn_fetch(id.clone())).collect();
            let settled = join_all(handles).await;

            for (id, joined) in chunk.iter().zip(settled) {
                let outcome = joined.unwrap_or_else(|e| {
                    self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                    Err(FetchError::Aborted(e.to_string()))
                });
                if let Err(e) = &outcome {
                    failed += 1;
                    debug!(id = %id, error = %e, "counter fetch failed");
                }
                results.insert(id.clone(), outcome);
            }
        }

        if failed > 0 {
            warn!(
                failed,
                attempted = misses.len(),
                "some counter fetches failed"
            );
        }

        results
    }

    /// Fetches one id on its own task, writing through on success.
    fn spawn_fetch(&self, id: String) -> JoinHandle<Result<u64, FetchError>> {
        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            metrics.fetches.fetch_add(1, Ordering::Relaxed);
            match fetcher.fetch(&id).await {
                Ok(value) => {
                    store.write().await.put(id, value);
                    Ok(value)
                }
                Err(e) => {
                    metrics.failures.fetch_add(1, Ordering::Relaxed);
                    Err(e)
                }
            }
        })
    }

    // == Get Counts ==
    /// Returns the counters that resolved; failed ids are simply absent.
    pub async fn get_counts(&self, ids: &[String], concurrency: usize) -> HashMap<String, u64> {
        self.resolve_counts(ids, concurrency)
            .await
            .into_iter()
            .filter_map(|(id, outcome)| outcome.ok().map(|value| (id, value)))
            .collect()
    }

    /// [`get_counts`](Self::get_counts) with the service's default concurrency.
    pub async fn get_counts_default(&self, ids: &[String]) -> HashMap<String, u64> {
        self.get_counts(ids, self.default_concurrency).await
    }

    // == Get Count ==
    /// Resolves a single counter, reporting failure to the caller.
    pub async fn try_get_count(&self, id: &str) -> Result<u64, FetchError> {
        self.resolve_counts(&[id.to_string()], 1)
            .await
            .remove(id)
            .unwrap_or_else(|| Err(FetchError::Aborted(format!("no outcome for '{}'", id))))
    }

    /// Resolves a single counter, substituting 0 when it cannot be fetched.
    ///
    /// The failure is logged and otherwise swallowed.
    pub async fn get_count(&self, id: &str) -> u64 {
        match self.try_get_count(id).await {
            Ok(value) => value,
            Err(e) => {
                warn!(id = %id, error = %e, "counter unavailable, using 0");
                0
            }
        }
    }

    // == Clear ==
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let dropped = store.len();
        store.clear();
        info!(dropped, "counter cache cleared");
    }

    // == Stats ==
    pub async fn stats(&self) -> CounterStats {
        let cache = self.store.read().await.stats();
        CounterStats {
            hit_rate: cache.hit_rate(),
            cache,
            fetches: self.metrics.fetches.load(Ordering::Relaxed),
            fetch_failures: self.metrics.failures.load(Ordering::Relaxed),
            default_concurrency: self.default_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    const TTL: u64 = 300_000;

    /// Fetcher that records calls and tracks how many are outstanding.
    #[derive(Default)]
    struct MockFetcher {
        values: HashMap<String, u64>,
        failing: HashSet<String>,
        panicking: HashSet<String>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        events: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockFetcher {
        fn with_values(pairs: &[(&str, u64)]) -> Self {
            Self {
                values: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                ..Self::default()
            }
        }

        fn failing(mut self, ids: &[&str]) -> Self {
            self.failing = ids.iter().map(|s| s.to_string()).collect();
            self
        }

        fn panicking(mut self, ids: &[&str]) -> Self {
            self.panicking = ids.iter().map(|s| s.to_string()).collect();
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, id: &str) -> Result<u64, FetchError> {
            self.calls.lock().unwrap().push(id.to_string());
            self.events.lock().unwrap().push(format!("start:{}", id));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.events.lock().unwrap().push(format!("end:{}", id));

            if self.panicking.contains(id) {
                panic!("fetcher blew up for {}", id);
            }
            if self.failing.contains(id) {
                return Err(FetchError::Status { status: 500 });
            }
            self.values
                .get(id)
                .copied()
                .ok_or_else(|| FetchError::Parse(format!("no value for {}", id)))
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn service(fetcher: &Arc<MockFetcher>) -> CounterService {
        CounterService::new(CacheStore::new(1000, TTL), fetcher.clone())
    }

    #[tokio::test]
    async fn test_hits_skip_fetcher() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("z", 30)]));
        let service = service(&fetcher);
        {
            let store = service.store();
            let mut store = store.write().await;
            store.put("x".to_string(), 10);
            store.put("y".to_string(), 20);
        }

        let counts = service.get_counts(&ids(&["x", "y", "z"]), 5).await;

        assert_eq!(fetcher.calls(), vec!["z".to_string()]);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["x"], 10);
        assert_eq!(counts["y"], 20);
        assert_eq!(counts["z"], 30);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let names: Vec<String> = (0..12).map(|i| format!("id-{}", i)).collect();
        let pairs: Vec<(&str, u64)> = names.iter().map(|n| (n.as_str(), 1)).collect();
        let fetcher = Arc::new(
            MockFetcher::with_values(&pairs).delayed(Duration::from_millis(20)),
        );
        let service = service(&fetcher);

        let counts = service.get_counts(&names, 5).await;

        assert_eq!(counts.len(), 12);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 5);
        assert_eq!(fetcher.calls().len(), 12);
    }

    #[tokio::test]
    async fn test_chunks_run_sequentially() {
        let names: Vec<String> = (0..7).map(|i| format!("id-{}", i)).collect();
        let pairs: Vec<(&str, u64)> = names.iter().map(|n| (n.as_str(), 1)).collect();
        let fetcher = Arc::new(
            MockFetcher::with_values(&pairs).delayed(Duration::from_millis(5)),
        );
        let service = service(&fetcher);

        service.get_counts(&names, 3).await;

        let events = fetcher.events.lock().unwrap().clone();
        let position = |event: String| events.iter().position(|e| *e == event).unwrap();
        for (k, chunk) in names.chunks(3).enumerate().skip(1) {
            let first_start = chunk
                .iter()
                .map(|id| position(format!("start:{}", id)))
                .min()
                .unwrap();
            for prev in &names[..k * 3] {
                assert!(
                    position(format!("end:{}", prev)) < first_start,
                    "chunk {} started before {} settled",
                    k,
                    prev
                );
            }
        }
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("x", 5), ("y", 6)]).failing(&["y"]));
        let service = service(&fetcher);

        let counts = service.get_counts(&ids(&["x", "y"]), 5).await;

        assert_eq!(counts.len(), 1);
        assert_eq!(counts["x"], 5);
        assert!(!counts.contains_key("y"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_chunks() {
        let fetcher = Arc::new(
            MockFetcher::with_values(&[("a", 1), ("b", 2), ("c", 3)]).failing(&["a"]),
        );
        let service = service(&fetcher);

        let counts = service.get_counts(&ids(&["a", "b", "c"]), 1).await;

        assert_eq!(counts.len(), 2);
        assert_eq!(fetcher.calls(), ids(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_resolve_reports_failures_per_id() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("x", 5)]).failing(&["y"]));
        let service = service(&fetcher);

        let outcomes = service.resolve_counts(&ids(&["x", "y"]), 5).await;

        assert_eq!(outcomes["x"], Ok(5));
        assert_eq!(outcomes["y"], Err(FetchError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_isolated() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("ok", 1)]).panicking(&["boom"]));
        let service = service(&fetcher);

        let outcomes = service.resolve_counts(&ids(&["boom", "ok"]), 5).await;

        assert!(matches!(outcomes["boom"], Err(FetchError::Aborted(_))));
        assert_eq!(outcomes["ok"], Ok(1));
        assert_eq!(service.stats().await.fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let fetcher = Arc::new(MockFetcher::default().failing(&["y"]));
        let service = service(&fetcher);

        service.get_counts(&ids(&["y"]), 5).await;
        service.get_counts(&ids(&["y"]), 5).await;

        assert_eq!(fetcher.calls().len(), 2);
        assert!(service.store().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_count_defaults_to_zero() {
        let fetcher = Arc::new(MockFetcher::default().failing(&["broken"]));
        let service = service(&fetcher);

        assert_eq!(service.get_count("broken").await, 0);
        assert!(service.try_get_count("broken").await.is_err());
    }

    #[tokio::test]
    async fn test_write_through_serves_later_single_get() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("z", 9)]));
        let service = service(&fetcher);

        let counts = service.get_counts(&ids(&["z"]), 5).await;
        assert_eq!(counts["z"], 9);

        assert_eq!(service.get_count("z").await, 9);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_fetch_once() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("a", 1)]));
        let service = service(&fetcher);

        let counts = service.get_counts(&ids(&["a", "a", "a"]), 2).await;

        assert_eq!(counts.len(), 1);
        assert_eq!(fetcher.calls(), ids(&["a"]));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_treated_as_one() {
        let fetcher = Arc::new(
            MockFetcher::with_values(&[("a", 1), ("b", 2)]).delayed(Duration::from_millis(5)),
        );
        let service = service(&fetcher);

        let counts = service.get_counts(&ids(&["a", "b"]), 0).await;

        assert_eq!(counts.len(), 2);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_request_still_warms_cache() {
        let fetcher = Arc::new(
            MockFetcher::with_values(&[("slow", 4)]).delayed(Duration::from_millis(50)),
        );
        let service = service(&fetcher);

        let names = ids(&["slow"]);
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), service.get_counts(&names, 5)).await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(service.store().write().await.get("slow"), Some(4));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("a", 1), ("b", 2)]).failing(&["b"]));
        let service = service(&fetcher).with_default_concurrency(3);

        service.get_counts_default(&ids(&["a", "b"])).await;
        service.get_count("a").await;

        let stats = service.stats().await;
        assert_eq!(stats.cache.size, 1);
        assert_eq!(stats.cache.max_size, 1000);
        assert_eq!(stats.cache.cache_duration_ms, TTL);
        assert_eq!(stats.cache.hits, 1);
        assert_eq!(stats.fetches, 2);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.default_concurrency, 3);

        service.clear().await;
        assert_eq!(service.stats().await.cache.size, 0);
    }

    #[tokio::test]
    async fn test_stats_serialize_flat_camel_case() {
        let fetcher = Arc::new(MockFetcher::with_values(&[("a", 1)]));
        let service = service(&fetcher);
        service.get_count("a").await;

        let json = serde_json::to_value(service.stats().await).unwrap();

        assert_eq!(json["size"], 1);
        assert_eq!(json["maxSize"], 1000);
        assert_eq!(json["cacheDurationMs"], TTL);
        assert_eq!(json["fetches"], 1);
        assert_eq!(json["fetchFailures"], 0);
        assert_eq!(json["defaultConcurrency"], 5);
        assert!(json.get("cache").is_none());
    }
}
