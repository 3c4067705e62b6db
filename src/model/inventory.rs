//! Externally supplied metric and alert inventories.
//!
//! These descriptors come from the alerting service and the JVM /
//! circuit-breaker metrics endpoints. The engine never writes them; it only
//! correlates observed traffic against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a metric was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSourceKind {
    Jvm,
    CircuitBreaker,
}

/// One emitted metric known to the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// Metric name as exported, e.g. `hystrix.ItemsCommand.errors`.
    pub name: String,
    pub source: MetricSourceKind,
    /// Last time the source saw this metric move, if it reports one.
    pub last_observed_at: Option<DateTime<Utc>>,
}

/// Alert severity as reported by the alerting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    #[default]
    Warning,
    Info,
    /// Anything the alerting service reports that we do not model.
    #[serde(other)]
    Unknown,
}

/// One configured alert known to the alerting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDescriptor {
    pub id: String,
    /// Owning team, the unit alert inventories are listed by.
    pub team: String,
    /// What the alert fires on, in the alerting service's own naming.
    pub target_pattern: String,
    #[serde(default)]
    pub severity: AlertSeverity,
}

impl AlertDescriptor {
    /// The surface the correlator matches against: the target pattern when
    /// present, the alert id otherwise.
    pub fn match_surface(&self) -> &str {
        if self.target_pattern.is_empty() {
            &self.id
        } else {
            &self.target_pattern
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_unknown_fallback() {
        let alert: AlertDescriptor = serde_json::from_str(
            r#"{"id":"a1","team":"payments","target_pattern":"p","severity":"page"}"#,
        )
        .unwrap();
        assert_eq!(alert.severity, AlertSeverity::Unknown);
    }

    #[test]
    fn test_match_surface_falls_back_to_id() {
        let alert = AlertDescriptor {
            id: "orders-5xx".into(),
            team: "orders".into(),
            target_pattern: String::new(),
            severity: AlertSeverity::Critical,
        };
        assert_eq!(alert.match_surface(), "orders-5xx");
    }
}
