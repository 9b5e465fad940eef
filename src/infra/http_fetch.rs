//! Outbound HTTP used by the extractor.

use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches the raw HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> CoreResult<String>;
}

/// `PageFetcher` backed by a shared reqwest client with an explicit timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slmobi/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> CoreResult<String> {
        let started = std::time::Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Fetch(format!("timed out fetching {}", url))
            } else {
                CoreError::Fetch(format!("request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Fetch(format!("reading body of {} failed: {}", url, e)))?;
        debug!(url, bytes = body.len(), elapsed = ?started.elapsed(), "fetched page");
        Ok(body)
    }
}
