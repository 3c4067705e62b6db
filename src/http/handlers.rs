//! Request handlers for the management API.
//!
//! # Responsibilities
//! - Accept pushed log lines for a pod
//! - Serve pool range queries with filters
//! - Trigger gap analysis runs
//! - Report service and retention status
//!
//! # Design Decisions
//! - Per-line failures never fail a batch; the outcome carries the counts
//! - Analysis always answers with a report; degraded inputs are annotated,
//!   only malformed requests are rejected
//! - Pool responses are capped so one query cannot serialize the whole store

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{self, AnalysisRequest};
use crate::http::server::AppState;
use crate::ingestion::ingest_lines;
use crate::model::CallRecord;
use crate::observability::metrics;
use crate::pool::{PoolStatus, QueryFilter, RetentionPolicy, TimeRange};

/// Records returned by a pool query when no limit is given.
const DEFAULT_POOL_LIMIT: usize = 10_000;
/// Hard cap on records returned by a single pool query.
const MAX_POOL_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitLinesRequest {
    pub lines: Vec<String>,
}

/// `POST /pods/{pod}/lines`: ingest raw log lines pushed for one pod.
pub async fn submit_lines(
    State(state): State<AppState>,
    Path(pod): Path<String>,
    Json(request): Json<SubmitLinesRequest>,
) -> Response {
    let started = Instant::now();

    let parser = state.parser.load_full();
    let outcome = ingest_lines(&parser, &state.pool, &pod, &request.lines);

    metrics::record_request("POST", "/pods/{pod}/lines", 200, started);
    (StatusCode::OK, Json(outcome)).into_response()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolQueryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub pod: Option<String>,
    pub method: Option<String>,
    pub endpoint_prefix: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /pool`: range query over stored call records.
///
/// `from` defaults to the beginning of time, `to` to now. An inverted range
/// is a valid, empty query.
pub async fn query_pool(
    State(state): State<AppState>,
    Query(params): Query<PoolQueryParams>,
) -> Response {
    let started = Instant::now();

    let range = TimeRange {
        from: params.from.unwrap_or(DateTime::<Utc>::MIN_UTC),
        to: params.to.unwrap_or_else(Utc::now),
    };
    let filter = QueryFilter {
        pod: params.pod,
        method: params.method,
        endpoint_prefix: params.endpoint_prefix,
    };
    let limit = params.limit.unwrap_or(DEFAULT_POOL_LIMIT).min(MAX_POOL_LIMIT);

    let records: Vec<CallRecord> = state.pool.query(range, filter).take(limit).collect();

    tracing::debug!(
        returned = records.len(),
        from = %range.from,
        to = %range.to,
        "Pool query served"
    );
    metrics::record_request("GET", "/pool", 200, started);
    (StatusCode::OK, Json(records)).into_response()
}

/// `POST /analysis`: run gap analysis over a time window.
pub async fn run_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    let started = Instant::now();

    if request.from > request.to {
        metrics::record_request("POST", "/analysis", 400, started);
        return (
            StatusCode::BAD_REQUEST,
            "analysis window is inverted: from must not exceed to",
        )
            .into_response();
    }

    let config = state.config.load_full();
    let report = analysis::run_analysis(&config, &state.pool, &state.inventories, &request).await;

    metrics::record_request("POST", "/analysis", 200, started);
    (StatusCode::OK, Json(report)).into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub ingestion_enabled: bool,
    pub tracked_pods: Vec<String>,
    pub pool: PoolStatus,
}

/// `GET /status`: service identity, uptime and pool occupancy.
pub async fn status(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let config = state.config.load();
    let response = StatusResponse {
        service: "gapwatch".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        ingestion_enabled: config.ingestion.enabled,
        tracked_pods: config.ingestion.pods.clone(),
        pool: state.pool.status(),
    };

    metrics::record_request("GET", "/status", 200, started);
    (StatusCode::OK, Json(response)).into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionResponse {
    pub policy: RetentionPolicy,
    pub eviction_interval_secs: u64,
    pub last_eviction_at: Option<DateTime<Utc>>,
}

/// `GET /retention`: active policy and eviction schedule.
pub async fn retention(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let pool_status = state.pool.status();
    let response = RetentionResponse {
        policy: pool_status.policy,
        eviction_interval_secs: state.config.load().retention.eviction_interval_secs,
        last_eviction_at: pool_status.last_eviction_at,
    };

    metrics::record_request("GET", "/retention", 200, started);
    (StatusCode::OK, Json(response)).into_response()
}
