//! Fetch Module
//!
//! The capability the cache uses to retrieve a counter it does not hold,
//! plus an HTTP implementation of it.

mod http;

use async_trait::async_trait;

use crate::error::FetchError;

pub use http::{HttpFetcher, MAX_PAYLOAD_BYTES};

// == Fetcher Trait ==
/// Retrieves the current value of one counter from upstream.
///
/// Each call is independent. Implementations do not retry; the cache never
/// retries either, so a failure here is final for the current request.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, id: &str) -> Result<u64, FetchError>;
}
