//! Upstream source traits.
//!
//! Everything the engine learns from the outside world arrives through these
//! traits, so tests can swap the HTTP implementations for in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AlertDescriptor, MetricDescriptor};

/// Errors from any upstream fetch (log stream, alert or metric inventory).
///
/// Fetch failures degrade the caller (cached data, skipped poll); they never
/// abort an analysis run or an ingestion loop.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        SourceError::Request(error.to_string())
    }
}

/// Inventory of configured alerts, keyed by owning team.
#[async_trait]
pub trait AlertSource: Send + Sync + std::fmt::Debug {
    async fn list_alerts(&self, team: &str) -> Result<Vec<AlertDescriptor>, SourceError>;
}

/// Inventory of emitted metrics for one scope (a service name).
#[async_trait]
pub trait MetricSource: Send + Sync + std::fmt::Debug {
    async fn list_metrics(&self, scope: &str) -> Result<Vec<MetricDescriptor>, SourceError>;
}
