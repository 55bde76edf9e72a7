//! Sleeper API source.
//!
//! [`Source`] is the seam the orchestrator fetches through; [`SleeperClient`]
//! is the HTTP implementation used outside of tests.

pub mod endpoints;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use endpoints::Endpoint;
pub use http::{RetryPolicy, SleeperClient, SLEEPER_BASE_URL};

/// A source of raw endpoint payloads.
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// Fetch one endpoint's JSON document.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value>;
}
