//! HTTP-backed inventory sources.
//!
//! Both upstreams speak plain JSON: either a bare array of descriptors or an
//! envelope object. The alert inventory paginates; pages are walked until
//! the upstream stops advancing or the page cap trips.

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::source::{AlertSource, MetricSource, SourceError};
use crate::model::{AlertDescriptor, MetricDescriptor};

/// Upper bound on pagination walks against a misbehaving upstream.
const MAX_ALERT_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct HttpAlertSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AlertPage {
    alerts: Vec<AlertDescriptor>,
    #[serde(default)]
    next_page: Option<u32>,
}

fn parse_alert_page(body: &str) -> Result<AlertPage, SourceError> {
    if let Ok(page) = serde_json::from_str::<AlertPage>(body) {
        return Ok(page);
    }
    let alerts = serde_json::from_str::<Vec<AlertDescriptor>>(body)
        .map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(AlertPage {
        alerts,
        next_page: None,
    })
}

impl HttpAlertSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(&self, team: &str, page: u32) -> Result<AlertPage, SourceError> {
        let response = self
            .client
            .get(format!("{}/alerts", self.base_url))
            .query(&[("team", team), ("page", &page.to_string())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_alert_page(&body)
    }
}

#[async_trait]
impl AlertSource for HttpAlertSource {
    async fn list_alerts(&self, team: &str) -> Result<Vec<AlertDescriptor>, SourceError> {
        let mut alerts = Vec::new();
        let mut page = 1u32;
        loop {
            let batch = self.fetch_page(team, page).await?;
            let fetched = batch.alerts.len();
            alerts.extend(batch.alerts);
            match batch.next_page {
                Some(next) if next > page && fetched > 0 => {
                    if next > MAX_ALERT_PAGES {
                        tracing::warn!(team, pages = page, "Alert pagination cap reached");
                        break;
                    }
                    page = next;
                }
                _ => break,
            }
        }
        Ok(alerts)
    }
}

#[derive(Debug, Clone)]
pub struct HttpMetricSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MetricEnvelope {
    metrics: Vec<MetricDescriptor>,
}

fn parse_metrics(body: &str) -> Result<Vec<MetricDescriptor>, SourceError> {
    if let Ok(envelope) = serde_json::from_str::<MetricEnvelope>(body) {
        return Ok(envelope.metrics);
    }
    serde_json::from_str::<Vec<MetricDescriptor>>(body)
        .map_err(|e| SourceError::Malformed(e.to_string()))
}

impl HttpMetricSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn list_metrics(&self, scope: &str) -> Result<Vec<MetricDescriptor>, SourceError> {
        let response = self
            .client
            .get(format!("{}/metrics", self.base_url))
            .query(&[("scope", scope)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_metrics(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alert_page_envelope() {
        let body = r#"{"alerts":[{"id":"ALR-1","team":"payments","target_pattern":"orders_errors"}],"next_page":2}"#;
        let page = parse_alert_page(body).unwrap();
        assert_eq!(page.alerts.len(), 1);
        assert_eq!(page.alerts[0].id, "ALR-1");
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn test_parse_alert_page_bare_array() {
        let body = r#"[{"id":"ALR-1","team":"payments","target_pattern":""}]"#;
        let page = parse_alert_page(body).unwrap();
        assert_eq!(page.alerts.len(), 1);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_parse_alert_page_rejects_garbage() {
        assert!(matches!(
            parse_alert_page("not json"),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_metrics_both_shapes() {
        let envelope = r#"{"metrics":[{"name":"jvm_memory_used","source":"jvm"}]}"#;
        assert_eq!(parse_metrics(envelope).unwrap().len(), 1);

        let bare = r#"[{"name":"cb_state","source":"circuit_breaker"}]"#;
        let metrics = parse_metrics(bare).unwrap();
        assert_eq!(metrics[0].name, "cb_state");
    }
}
