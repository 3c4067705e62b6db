//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds ordered, intervals > 0)
//! - Check that regexes compile and addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GapwatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use url::Url;

use crate::config::schema::{GapwatchConfig, VolumeThresholds};

const BUILTIN_FORMATS: &[&str] = &["combined", "json", "plain"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// One semantic problem found in a configuration.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GapwatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_parser(config, &mut errors);
    validate_pool(config, &mut errors);
    validate_retention(config, &mut errors);
    validate_correlation(config, &mut errors);
    validate_analysis(config, &mut errors);
    validate_inventory(config, &mut errors);
    validate_ingestion(config, &mut errors);
    validate_http(config, &mut errors);
    validate_observability(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_parser(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let parser = &config.parser;

    if parser.formats.is_empty() {
        errors.push(ValidationError::new(
            "parser.formats",
            "at least one format is required",
        ));
    }
    for format in &parser.formats {
        let known = BUILTIN_FORMATS.contains(&format.as_str())
            || parser.custom_formats.iter().any(|c| c.name == *format);
        if !known {
            errors.push(ValidationError::new(
                "parser.formats",
                format!("unknown format '{}'", format),
            ));
        }
    }
    for (i, pattern) in parser.opaque_id_patterns.iter().enumerate() {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::new(
                "parser.opaque_id_patterns",
                format!("pattern {} does not compile: {}", i, e),
            ));
        }
    }
    for custom in &parser.custom_formats {
        if custom.name.is_empty() {
            errors.push(ValidationError::new(
                "parser.custom_formats",
                "custom format name must not be empty",
            ));
        }
        match Regex::new(&custom.pattern) {
            Ok(re) => {
                let groups: Vec<&str> = re.capture_names().flatten().collect();
                for required in ["method", "path"] {
                    if !groups.contains(&required) {
                        errors.push(ValidationError::new(
                            "parser.custom_formats",
                            format!("format '{}' is missing named group '{}'", custom.name, required),
                        ));
                    }
                }
            }
            Err(e) => {
                errors.push(ValidationError::new(
                    "parser.custom_formats",
                    format!("format '{}' does not compile: {}", custom.name, e),
                ));
            }
        }
    }
}

fn validate_pool(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    if config.pool.segment_capacity == 0 {
        errors.push(ValidationError::new(
            "pool.segment_capacity",
            "must be greater than zero",
        ));
    }
}

fn validate_retention(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let retention = &config.retention;

    if retention.max_age_days == 0 && retention.max_records == 0 {
        errors.push(ValidationError::new(
            "retention",
            "max_age_days and max_records cannot both be zero; the pool would grow without bound",
        ));
    }
    if retention.eviction_interval_secs == 0 {
        errors.push(ValidationError::new(
            "retention.eviction_interval_secs",
            "must be greater than zero",
        ));
    }
}

fn validate_correlation(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let threshold = config.correlation.threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        errors.push(ValidationError::new(
            "correlation.threshold",
            format!("must be in (0.0, 1.0], got {}", threshold),
        ));
    }
}

fn validate_thresholds(field: &str, tiers: &VolumeThresholds, errors: &mut Vec<ValidationError>) {
    if tiers.low == 0 {
        errors.push(ValidationError::new(field, "low tier must be greater than zero"));
    }
    if !(tiers.high > tiers.medium && tiers.medium > tiers.low) {
        errors.push(ValidationError::new(
            field,
            format!(
                "tiers must satisfy high > medium > low, got {} / {} / {}",
                tiers.high, tiers.medium, tiers.low
            ),
        ));
    }
}

fn validate_analysis(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    validate_thresholds("analysis.thresholds", &config.analysis.thresholds, errors);
    for (service, tiers) in &config.analysis.service_overrides {
        let field = format!("analysis.service_overrides.{}", service);
        validate_thresholds(&field, tiers, errors);
    }
}

fn validate_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if let Err(e) = Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

fn validate_retry(field: &str, attempts: u32, timeout_ms: u64, errors: &mut Vec<ValidationError>) {
    if attempts == 0 {
        errors.push(ValidationError::new(field, "attempts must be at least 1"));
    }
    if timeout_ms == 0 {
        errors.push(ValidationError::new(field, "timeout_ms must be greater than zero"));
    }
}

fn validate_inventory(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let inventory = &config.inventory;
    validate_url("inventory.alerts_url", &inventory.alerts_url, errors);
    validate_url("inventory.metrics_url", &inventory.metrics_url, errors);
    validate_retry(
        "inventory.retry",
        inventory.retry.attempts,
        inventory.retry.timeout_ms,
        errors,
    );
}

fn validate_ingestion(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let ingestion = &config.ingestion;
    validate_url("ingestion.logs_url", &ingestion.logs_url, errors);
    if ingestion.enabled && ingestion.poll_interval_secs == 0 {
        errors.push(ValidationError::new(
            "ingestion.poll_interval_secs",
            "must be greater than zero",
        ));
    }
    validate_retry(
        "ingestion.retry",
        ingestion.retry.attempts,
        ingestion.retry.timeout_ms,
        errors,
    );
}

fn validate_http(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    if config.http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "http.bind_address",
            format!("invalid socket address '{}'", config.http.bind_address),
        ));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "http.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "http.max_body_bytes",
            "must be greater than zero",
        ));
    }
}

fn validate_observability(config: &GapwatchConfig, errors: &mut Vec<ValidationError>) {
    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "unknown level '{}', expected one of {}",
                observability.log_level,
                LOG_LEVELS.join("/")
            ),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", observability.metrics_address),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CustomFormatConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GapwatchConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut config = GapwatchConfig::default();
        config.pool.segment_capacity = 0;
        config.correlation.threshold = 1.5;
        config.http.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"pool.segment_capacity"));
        assert!(fields.contains(&"correlation.threshold"));
        assert!(fields.contains(&"http.bind_address"));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = GapwatchConfig::default();
        config.analysis.thresholds.medium = 200_000;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "analysis.thresholds"));
    }

    #[test]
    fn test_rejects_zero_low_tier_in_override() {
        let mut config = GapwatchConfig::default();
        config.analysis.service_overrides.insert(
            "checkout".to_string(),
            VolumeThresholds { high: 100, medium: 10, low: 0 },
        );

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "analysis.service_overrides.checkout"));
    }

    #[test]
    fn test_rejects_unbounded_retention() {
        let mut config = GapwatchConfig::default();
        config.retention.max_age_days = 0;
        config.retention.max_records = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "retention"));
    }

    #[test]
    fn test_rejects_bad_custom_format() {
        let mut config = GapwatchConfig::default();
        config.parser.custom_formats.push(CustomFormatConfig {
            name: "audit".to_string(),
            pattern: "^(?P<method>\\S+)$".to_string(),
        });

        let errors = validate_config(&config).unwrap_err();
        // Compiles but lacks the `path` group.
        assert!(errors
            .iter()
            .any(|e| e.field == "parser.custom_formats" && e.message.contains("path")));
    }

    #[test]
    fn test_rejects_unknown_format_name() {
        let mut config = GapwatchConfig::default();
        config.parser.formats.push("syslog".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("syslog")));
    }

    #[test]
    fn test_custom_format_usable_in_format_order() {
        let mut config = GapwatchConfig::default();
        config.parser.custom_formats.push(CustomFormatConfig {
            name: "audit".to_string(),
            pattern: "^(?P<method>\\S+) (?P<path>\\S+)$".to_string(),
        });
        config.parser.formats.push("audit".to_string());

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_inventory_url() {
        let mut config = GapwatchConfig::default();
        config.inventory.alerts_url = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "inventory.alerts_url"));
    }
}
