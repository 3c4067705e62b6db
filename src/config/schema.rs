//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::correlation::tokens::DEFAULT_STOP_SEGMENTS;
use crate::resilience::RetryPlan;

/// Root configuration for the coverage-gap engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GapwatchConfig {
    /// Log line parsing and endpoint normalization.
    pub parser: ParserConfig,

    /// Pool store sizing and persistence.
    pub pool: PoolConfig,

    /// Retention policy and eviction schedule.
    pub retention: RetentionConfig,

    /// Endpoint-to-inventory matching.
    pub correlation: CorrelationConfig,

    /// Gap classification thresholds.
    pub analysis: AnalysisConfig,

    /// Alert and metric inventory upstreams.
    pub inventory: InventoryConfig,

    /// Log polling workers.
    pub ingestion: IngestionConfig,

    /// Service HTTP surface.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One custom log format recognized by a named regex.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomFormatConfig {
    /// Format name, usable in the `formats` ordering and as a parse hint.
    pub name: String,

    /// Regex with named groups: `method` and `path` required; `status`,
    /// `ip`, `latency_ms`, `timestamp` optional.
    pub pattern: String,
}

/// Parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Matcher order; first match wins. Built-ins: `combined`, `json`,
    /// `plain`. Custom format names may appear here too.
    pub formats: Vec<String>,

    /// Extra regexes whose matching path segments normalize to `{id}`.
    pub opaque_id_patterns: Vec<String>,

    /// Custom line formats.
    pub custom_formats: Vec<CustomFormatConfig>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            formats: vec![
                "combined".to_string(),
                "json".to_string(),
                "plain".to_string(),
            ],
            opaque_id_patterns: Vec::new(),
            custom_formats: Vec::new(),
        }
    }
}

/// Pool store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Records per sealed segment; bounds the tail copied under the write
    /// lock during queries.
    pub segment_capacity: usize,

    /// JSON-lines backing file. None disables persistence.
    pub persistence_path: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            segment_capacity: 4096,
            persistence_path: None,
        }
    }
}

/// Retention policy and eviction schedule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Records older than this are evicted. 0 disables the age pass.
    pub max_age_days: u32,

    /// Hard cap on stored records. 0 disables the count pass.
    pub max_records: usize,

    /// Seconds between eviction passes.
    pub eviction_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            max_records: 1_000_000,
            eviction_interval_secs: 3_600,
        }
    }
}

/// Correlation tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum Jaccard score for a candidate to count as coverage.
    pub threshold: f64,

    /// Tokens ignored on both sides of the comparison.
    pub stop_segments: Vec<String>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.30,
            stop_segments: DEFAULT_STOP_SEGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Volume tiers for gap classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeThresholds {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            high: 10_000,
            medium: 1_000,
            low: 100,
        }
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default volume tiers.
    pub thresholds: VolumeThresholds,

    /// Per-service tier overrides, keyed by service name.
    pub service_overrides: HashMap<String, VolumeThresholds>,
}

/// Inventory upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Alert inventory base URL.
    pub alerts_url: String,

    /// Metric inventory base URL.
    pub metrics_url: String,

    /// Seconds a fetched inventory stays fresh.
    pub cache_ttl_secs: u64,

    /// Teams whose alerts feed a run when the request names none.
    pub teams: Vec<String>,

    /// Metric scope used when a run names no service.
    pub default_scope: Option<String>,

    /// Retry budget for inventory fetches.
    pub retry: RetryPlan,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            alerts_url: "http://127.0.0.1:9801".to_string(),
            metrics_url: "http://127.0.0.1:9802".to_string(),
            cache_ttl_secs: 86_400,
            teams: Vec::new(),
            default_scope: None,
            retry: RetryPlan::default(),
        }
    }
}

/// Log polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Enable the polling workers. The submit endpoint works either way.
    pub enabled: bool,

    /// Platform log endpoint base URL.
    pub logs_url: String,

    /// Pods to poll; one worker each.
    pub pods: Vec<String>,

    /// Seconds between polls per pod.
    pub poll_interval_secs: u64,

    /// Retry budget for log fetches.
    pub retry: RetryPlan,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            logs_url: "http://127.0.0.1:9800".to_string(),
            pods: Vec::new(),
            poll_interval_secs: 60,
            retry: RetryPlan::default(),
        }
    }
}

/// Service HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_gets_defaults() {
        let config: GapwatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.retention.max_age_days, 30);
        assert_eq!(config.retention.max_records, 1_000_000);
        assert_eq!(config.analysis.thresholds.high, 10_000);
        assert_eq!(config.correlation.threshold, 0.30);
        assert_eq!(config.pool.segment_capacity, 4096);
        assert!(config.ingestion.pods.is_empty());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let doc = r#"
            [retention]
            max_age_days = 7
            max_records = 5000

            [analysis.thresholds]
            high = 200000

            [analysis.service_overrides.checkout]
            high = 50
            medium = 20
            low = 5

            [correlation]
            threshold = 0.5
            stop_segments = ["api"]

            [[parser.custom_formats]]
            name = "audit"
            pattern = "^(?P<method>\\S+) (?P<path>\\S+)$"

            [ingestion]
            pods = ["pod-a", "pod-b"]
            poll_interval_secs = 15
        "#;
        let config: GapwatchConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.retention.max_age_days, 7);
        assert_eq!(config.analysis.thresholds.high, 200_000);
        // Unset tiers inside an overridden table fall back to defaults.
        assert_eq!(config.analysis.thresholds.medium, 1_000);
        assert_eq!(config.analysis.service_overrides["checkout"].high, 50);
        assert_eq!(config.correlation.stop_segments, vec!["api"]);
        assert_eq!(config.parser.custom_formats[0].name, "audit");
        assert_eq!(config.ingestion.pods.len(), 2);
        assert_eq!(config.ingestion.poll_interval_secs, 15);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = GapwatchConfig::default();
        let doc = toml::to_string(&config).unwrap();
        let parsed: GapwatchConfig = toml::from_str(&doc).unwrap();
        assert_eq!(parsed.analysis.thresholds, config.analysis.thresholds);
        assert_eq!(parsed.http.bind_address, config.http.bind_address);
        assert_eq!(parsed.inventory.cache_ttl_secs, config.inventory.cache_ttl_secs);
    }
}
