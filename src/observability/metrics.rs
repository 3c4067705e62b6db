//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define engine metrics (ingestion, pool, inventory, analysis, HTTP)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-pod and aggregate counters
//!
//! # Metrics
//! - `gapwatch_ingested_records_total` (counter): accepted records by pod
//! - `gapwatch_parse_skips_total` (counter): unparseable lines by pod
//! - `gapwatch_store_drops_total` (counter): records the store refused, by pod
//! - `gapwatch_polls_total` (counter): log polls by pod, outcome
//! - `gapwatch_inventory_lookups_total` (counter): by inventory, outcome
//! - `gapwatch_analysis_runs_total` (counter): completed gap analysis runs
//! - `gapwatch_analysis_duration_seconds` (histogram): run wall time
//! - `gapwatch_analysis_gaps` (gauge): gaps found by the latest run
//! - `gapwatch_evicted_records_total` (counter): evictions by pass
//! - `gapwatch_pool_records` (gauge): records held after the latest eviction
//! - `gapwatch_requests_total` (counter): HTTP requests by method, route, status
//! - `gapwatch_request_duration_seconds` (histogram): HTTP latency by method, route
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Helpers keep label names consistent across call sites
//! - Route label uses the matched pattern, never the raw path

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pool::EvictionStats;

/// Start the Prometheus exposition endpoint and register metric help text.
///
/// Must be called from within a Tokio runtime; the exporter spawns its own
/// listener task.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }
}

fn describe_metrics() {
    metrics::describe_counter!(
        "gapwatch_ingested_records_total",
        "Call records accepted into the pool"
    );
    metrics::describe_counter!(
        "gapwatch_parse_skips_total",
        "Log lines skipped because no format matched"
    );
    metrics::describe_counter!(
        "gapwatch_store_drops_total",
        "Parsed records the pool store refused"
    );
    metrics::describe_counter!("gapwatch_polls_total", "Log polls by pod and outcome");
    metrics::describe_counter!(
        "gapwatch_inventory_lookups_total",
        "Inventory lookups by inventory and outcome"
    );
    metrics::describe_counter!("gapwatch_analysis_runs_total", "Completed gap analysis runs");
    metrics::describe_histogram!(
        "gapwatch_analysis_duration_seconds",
        "Wall time of a gap analysis run"
    );
    metrics::describe_gauge!("gapwatch_analysis_gaps", "Gaps found by the latest run");
    metrics::describe_counter!(
        "gapwatch_evicted_records_total",
        "Records evicted from the pool by pass"
    );
    metrics::describe_gauge!(
        "gapwatch_pool_records",
        "Records held by the pool after the latest eviction"
    );
    metrics::describe_counter!(
        "gapwatch_requests_total",
        "HTTP requests by method, route and status"
    );
    metrics::describe_histogram!(
        "gapwatch_request_duration_seconds",
        "HTTP request latency by method and route"
    );
}

/// Record accepted records for a pod.
pub fn record_ingested(pod: &str, count: usize) {
    metrics::counter!("gapwatch_ingested_records_total", "pod" => pod.to_string())
        .increment(count as u64);
}

/// Record a log line skipped by the parser.
pub fn record_parse_skip(pod: &str) {
    metrics::counter!("gapwatch_parse_skips_total", "pod" => pod.to_string()).increment(1);
}

/// Record a parsed record the pool store refused.
pub fn record_store_drop(pod: &str) {
    metrics::counter!("gapwatch_store_drops_total", "pod" => pod.to_string()).increment(1);
}

/// Record one poll of a pod's log endpoint.
pub fn record_poll(pod: &str, outcome: &str) {
    metrics::counter!(
        "gapwatch_polls_total",
        "pod" => pod.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an inventory lookup and how it was satisfied
/// (cache, fetch, stale or unavailable).
pub fn record_inventory_lookup(inventory: &str, outcome: &str) {
    metrics::counter!(
        "gapwatch_inventory_lookups_total",
        "inventory" => inventory.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a completed analysis run.
pub fn record_analysis_run(gap_count: usize, elapsed: Duration) {
    metrics::counter!("gapwatch_analysis_runs_total").increment(1);
    metrics::histogram!("gapwatch_analysis_duration_seconds").record(elapsed.as_secs_f64());
    metrics::gauge!("gapwatch_analysis_gaps").set(gap_count as f64);
}

/// Record the results of an eviction pass.
pub fn record_eviction(stats: &EvictionStats) {
    metrics::counter!("gapwatch_evicted_records_total", "pass" => "age")
        .increment(stats.evicted_by_age as u64);
    metrics::counter!("gapwatch_evicted_records_total", "pass" => "count")
        .increment(stats.evicted_by_count as u64);
    metrics::gauge!("gapwatch_pool_records").set(stats.remaining as f64);
}

/// Record a completed HTTP request against the matched route.
pub fn record_request(method: &str, route: &str, status: u16, started: Instant) {
    metrics::counter!(
        "gapwatch_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gapwatch_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}
