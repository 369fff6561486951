//! HTTP Fetcher
//!
//! Reads counters from an upstream JSON endpoint with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::Fetcher;
use crate::error::FetchError;

/// Largest upstream body read before giving up on a payload
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Upstream payload. Only the counter field is read.
#[derive(Debug, Deserialize)]
struct CountPayload {
    #[serde(alias = "total", alias = "commentCount")]
    count: u64,
}

// == HTTP Fetcher ==
/// Fetches `GET <base_url>/<id>` and reads the `count` field of the JSON body.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    // == Constructor ==
    /// Creates a fetcher for `base_url` with a per-request `timeout`.
    ///
    /// Fails if the URL does not parse or cannot carry path segments.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            FetchError::Transport(format!("invalid upstream url '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Transport(format!(
                "upstream url '{}' cannot take a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Builds the request URL for `id`, appended as one encoded path segment.
    pub fn url_for(&self, id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("cannot append id to '{}'", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> Result<u64, FetchError> {
        let url = self.url_for(id)?;
        debug!(%url, "fetching counter");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_PAYLOAD_BYTES as u64 {
                return Err(oversized_payload());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > MAX_PAYLOAD_BYTES {
                return Err(oversized_payload());
            }
            body.extend_from_slice(&chunk);
        }
        let payload: CountPayload =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(payload.count)
    }
}

fn oversized_payload() -> FetchError {
    FetchError::Parse(format!("payload exceeds {} bytes", MAX_PAYLOAD_BYTES))
}
