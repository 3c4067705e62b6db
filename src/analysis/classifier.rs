//! Volume/coverage classification of correlated endpoints.

use std::collections::HashMap;

use crate::config::{AnalysisConfig, VolumeThresholds};
use crate::correlation::Correlation;
use crate::model::{CoverageGap, EndpointKey, GapPriority};

/// Applies the priority precedence rules to one endpoint at a time.
///
/// Thresholds come from configuration, with optional per-service overrides;
/// the rules themselves are fixed. First matching rule wins:
///
/// 1. volume >= high and either signal missing      → Critical
/// 2. volume >= medium and no alert                 → High
/// 3. volume >= low and either signal missing       → Medium
/// 4. any traffic and both signals missing          → Low
///
/// Fully covered endpoints produce no gap.
#[derive(Debug, Clone)]
pub struct GapClassifier {
    defaults: VolumeThresholds,
    overrides: HashMap<String, VolumeThresholds>,
}

impl GapClassifier {
    pub fn new(defaults: VolumeThresholds) -> Self {
        Self {
            defaults,
            overrides: HashMap::new(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            defaults: config.thresholds,
            overrides: config.service_overrides.clone(),
        }
    }

    fn thresholds_for(&self, service: Option<&str>) -> VolumeThresholds {
        service
            .and_then(|s| self.overrides.get(s).copied())
            .unwrap_or(self.defaults)
    }

    pub fn classify(
        &self,
        endpoint: EndpointKey,
        volume: u64,
        correlation: &Correlation,
        service: Option<&str>,
    ) -> Option<CoverageGap> {
        let thresholds = self.thresholds_for(service);
        let has_metric = correlation.metric.is_some();
        let has_alert = correlation.alert.is_some();
        let priority = priority_for(volume, has_metric, has_alert, thresholds)?;
        Some(CoverageGap {
            endpoint,
            call_volume: volume,
            has_metric,
            has_alert,
            priority,
            matched_metric: correlation.metric.as_ref().map(|m| m.name.clone()),
            matched_alert: correlation.alert.as_ref().map(|a| a.name.clone()),
        })
    }
}

fn priority_for(
    volume: u64,
    has_metric: bool,
    has_alert: bool,
    thresholds: VolumeThresholds,
) -> Option<GapPriority> {
    let missing_any = !has_metric || !has_alert;
    if volume >= thresholds.high && missing_any {
        return Some(GapPriority::Critical);
    }
    if volume >= thresholds.medium && !has_alert {
        return Some(GapPriority::High);
    }
    if volume >= thresholds.low && missing_any {
        return Some(GapPriority::Medium);
    }
    if volume > 0 && !has_metric && !has_alert {
        return Some(GapPriority::Low);
    }
    None
}

/// Report order: priority, then volume descending, then endpoint.
pub fn sort_gaps(gaps: &mut [CoverageGap]) {
    gaps.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.call_volume.cmp(&a.call_volume))
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });
}
