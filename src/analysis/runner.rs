//! One gap-analysis run, end to end.
//!
//! A run never fails wholesale: inventory trouble degrades to stale or
//! missing inputs, recorded in the report's annotations, and the pool query
//! works on an owned snapshot so a cancelled run leaves nothing behind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{sort_gaps, GapClassifier};
use crate::analysis::report::{GapReport, InputAccounting, InventoryAnnotation};
use crate::config::GapwatchConfig;
use crate::correlation::CorrelationEngine;
use crate::inventory::InventoryHub;
use crate::model::{AlertDescriptor, EndpointKey};
use crate::observability::metrics;
use crate::pool::{PoolStore, QueryFilter, TimeRange};

/// Parameters of one run, straight from the HTTP body or the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Scope for metric lookup and threshold overrides.
    #[serde(default)]
    pub service: Option<String>,
    /// Teams whose alert inventories feed the run; empty means the
    /// configured default set.
    #[serde(default)]
    pub teams: Vec<String>,
}

pub async fn run_analysis(
    config: &GapwatchConfig,
    pool: &PoolStore,
    inventories: &InventoryHub,
    request: &AnalysisRequest,
) -> GapReport {
    let started = std::time::Instant::now();
    let window = TimeRange::new(request.from, request.to);

    // Inventories first; each team and scope degrades on its own.
    let teams = if request.teams.is_empty() {
        config.inventory.teams.clone()
    } else {
        request.teams.clone()
    };
    let mut alerts: Vec<AlertDescriptor> = Vec::new();
    let mut annotations = Vec::new();
    for team in &teams {
        let snapshot = inventories.alerts_for(team).await;
        annotations.push(InventoryAnnotation {
            inventory: "alerts".to_string(),
            scope: team.clone(),
            freshness: snapshot.freshness,
        });
        alerts.extend(snapshot.items);
    }

    let scope = request
        .service
        .clone()
        .or_else(|| config.inventory.default_scope.clone())
        .unwrap_or_else(|| "default".to_string());
    let metric_snapshot = inventories.metrics_for(&scope).await;
    annotations.push(InventoryAnnotation {
        inventory: "metrics".to_string(),
        scope,
        freshness: metric_snapshot.freshness,
    });
    let metric_inventory = metric_snapshot.items;

    // Aggregate call volume per endpoint over the window. BTreeMap keeps
    // the iteration order, and with it the output, reproducible.
    let mut volumes: BTreeMap<EndpointKey, u64> = BTreeMap::new();
    let mut records_scanned = 0u64;
    for record in pool.query(window, QueryFilter::default()) {
        records_scanned += 1;
        *volumes.entry(record.endpoint_key()).or_insert(0) += 1;
    }

    let engine = CorrelationEngine::from_config(&config.correlation);
    let classifier = GapClassifier::from_config(&config.analysis);
    let service = request.service.as_deref();

    let mut gaps = Vec::new();
    for (endpoint, volume) in &volumes {
        let correlation = engine.correlate(endpoint, &metric_inventory, &alerts);
        if let Some(gap) = classifier.classify(endpoint.clone(), *volume, &correlation, service) {
            gaps.push(gap);
        }
    }
    sort_gaps(&mut gaps);

    let inputs = InputAccounting {
        records_scanned,
        distinct_endpoints: volumes.len() as u64,
    };
    let report = GapReport::assemble(window, request.service.clone(), gaps, inputs, annotations);

    metrics::record_analysis_run(report.gaps.len(), started.elapsed());
    tracing::info!(
        run_id = %report.run_id,
        records = records_scanned,
        endpoints = inputs.distinct_endpoints,
        gaps = report.gaps.len(),
        complete = report.complete(),
        "Gap analysis run finished"
    );
    report
}
