//! Outbound playlist fetching

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::errors::{FetchError, FetchResult};

/// Status and body of a completed request. Non-success statuses are
/// returned here rather than as errors; the caller decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchResponse>;
}

/// reqwest-backed fetcher with a bounded request timeout
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchResponse> {
        debug!("Fetching playlist from {}", url);

        let response = self.client.get(url).send().await.map_err(FetchError::from)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(FetchError::from)?;

        debug!("Fetched {} bytes from {} (HTTP {})", body.len(), url, status);
        Ok(FetchResponse { status, body })
    }
}
