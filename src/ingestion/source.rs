//! Raw log line sources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::inventory::SourceError;

/// A readable stream of log lines for one pod.
///
/// The platform only keeps a short window of logs, so callers poll
/// frequently and the pool store provides the real history.
#[async_trait]
pub trait LogSource: Send + Sync + std::fmt::Debug {
    /// Lines emitted by `pod` since `since`, oldest first.
    async fn fetch_lines(
        &self,
        pod: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, SourceError>;
}

/// Platform log endpoint speaking plain text, one log line per line.
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLogSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch_lines(
        &self,
        pod: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(format!("{}/pods/{}/logs", self.base_url, pod))
            .query(&[("since", &since.to_rfc3339())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}
