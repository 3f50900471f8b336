//! Retrieval of the metrics index for a collection.
//!
//! The endpoint is derived from the collection path by appending the
//! `.size.json` selector. Every failure comes back as a [`FetchError`];
//! nothing is left pending and nothing is cached.

use crate::folder_metrics::record::{IndexError, MetricsIndex};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Selector and extension appended to a collection path.
pub const SIZE_SELECTOR: &str = ".size.json";

/// Errors that can occur while fetching metrics.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP client could not be configured.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request or the body read failed.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body was not a metrics index.
    #[error("Malformed metrics from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: IndexError,
    },
}

impl FetchError {
    /// Whether another attempt could succeed.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => status.is_server_error(),
            FetchError::Client(_) | FetchError::Parse { .. } => false,
        }
    }
}

/// Endpoint path for a collection, e.g. `/content/dam/x.size.json`.
pub fn metrics_endpoint(collection_path: &str) -> String {
    format!("{}{}", collection_path, SIZE_SELECTOR)
}

/// Anything that can produce a metrics index for a collection path.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the index for the children of `collection_path`.
    async fn fetch(&self, collection_path: &str) -> Result<MetricsIndex, FetchError>;
}

/// HTTP fetcher settings.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Scheme and authority the collection path is appended to.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub retry_backoff: Duration,
}

impl FetcherConfig {
    /// Single attempt, no timeout, against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            max_retries: 0,
            retry_backoff: Duration::from_millis(200),
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the number of retries after transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Fetches `{base_url}{collection_path}.size.json` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetricsFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl HttpMetricsFetcher {
    /// Build the HTTP client for `config`.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::Client)?;

        Ok(Self { client, config })
    }

    /// Full URL for a collection path.
    pub fn url_for(&self, collection_path: &str) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            metrics_endpoint(collection_path)
        )
    }

    async fn fetch_once(&self, url: &str) -> Result<MetricsIndex, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        MetricsIndex::from_slice(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsFetcher {
    async fn fetch(&self, collection_path: &str) -> Result<MetricsIndex, FetchError> {
        let url = self.url_for(collection_path);
        let mut attempt = 0;

        // Attempts run back to back, so one request is in flight at a time.
        loop {
            match self.fetch_once(&url).await {
                Ok(index) => {
                    tracing::debug!("Fetched {} metrics entries from {}", index.len(), url);
                    return Ok(index);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        "Metrics fetch attempt {} for {} failed: {}, retrying in {:?}",
                        attempt,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
