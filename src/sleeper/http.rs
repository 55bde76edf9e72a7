//! HTTP client for the Sleeper API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Endpoint, Source};
use crate::error::{Result, SyncError};

/// Public Sleeper API, version 1.
pub const SLEEPER_BASE_URL: &str = "https://api.sleeper.app/v1/";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Bounded exponential backoff for transient request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first. `1` disables retries.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        // Attempts are bounded by `max_attempts`, not by elapsed time
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Stateless Sleeper client. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct SleeperClient {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl SleeperClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            SyncError::configuration(format!("invalid base URL {base_url:?}: {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SyncError::configuration(format!(
                "base URL must be http or https, got {base_url}"
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        self.base_url
            .join(&endpoint.path())
            .map_err(|e| SyncError::configuration(format!("invalid endpoint {endpoint}: {e}")))
    }

    /// Fetch one endpoint, retrying transient failures per the retry policy.
    pub async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let url = self.url_for(endpoint)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let attempts = AtomicU32::new(0);

        let operation = || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let url = &url;
            async move {
                self.get_once(url).await.map_err(|error| {
                    if error.is_retryable() && attempt < max_attempts {
                        warn!(%url, attempt, max_attempts, %error, "retrying Sleeper request");
                        backoff::Error::transient(error)
                    } else {
                        backoff::Error::permanent(error)
                    }
                })
            }
        };

        backoff::future::retry(self.retry.backoff(), operation).await
    }

    async fn get_once(&self, url: &Url) -> Result<Value> {
        debug!(%url, "GET");
        let transport = |source| SyncError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Source for SleeperClient {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value> {
        self.get_json(endpoint).await
    }
}
