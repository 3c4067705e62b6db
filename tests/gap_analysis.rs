//! End-to-end gap analysis scenarios against live mock inventories.

use chrono::{Duration, Utc};
use gapwatch::analysis::GapReport;
use gapwatch::config::GapwatchConfig;
use gapwatch::ingestion::IngestOutcome;
use gapwatch::inventory::InventoryFreshness;
use gapwatch::model::GapPriority;
use gapwatch::resilience::RetryPlan;
use serde_json::json;

mod common;

fn fast_retry() -> RetryPlan {
    RetryPlan {
        attempts: 1,
        timeout_ms: 2_000,
        backoff_base_ms: 10,
        backoff_max_ms: 20,
    }
}

/// A hot endpoint with no matching metric and no matching alert must come
/// back as a single Critical gap under default thresholds.
#[tokio::test]
async fn test_uncovered_hot_endpoint_is_critical() {
    let alerts_addr = common::start_json_server(
        200,
        json!({
            "alerts": [{
                "id": "checkout-latency-p99",
                "team": "payments",
                "target_pattern": "checkout latency p99",
                "severity": "warning",
            }]
        })
        .to_string(),
    )
    .await;
    let metrics_addr = common::start_json_server(
        200,
        json!({
            "metrics": [{
                "name": "orders_service_request_count",
                "source": "jvm",
                "last_observed_at": null,
            }]
        })
        .to_string(),
    )
    .await;

    let mut config = GapwatchConfig::default();
    config.ingestion.enabled = false;
    config.inventory.alerts_url = format!("http://{}", alerts_addr);
    config.inventory.metrics_url = format!("http://{}", metrics_addr);
    config.inventory.retry = fast_retry();
    let engine = common::spawn_engine(config).await;
    let client = common::client();

    // The two canonical lines plus 50,000 synthetic ones on the same
    // template, batched to stay under the request body limit.
    let res = client
        .post(format!("{}/pods/pod-1/lines", engine.base_url))
        .json(&json!({
            "lines": [
                "GET /items/123 200 10ms ip=10.0.0.5",
                "GET /items/456 200 12ms ip=10.0.0.6",
            ]
        }))
        .send()
        .await
        .expect("Engine unreachable");
    assert_eq!(res.status(), 200);

    let mut ingested = 2;
    for batch in 0..10 {
        let lines: Vec<String> = (0..5_000)
            .map(|i| format!("GET /items/{} 200 7ms", batch * 5_000 + i))
            .collect();
        let outcome: IngestOutcome = client
            .post(format!("{}/pods/pod-1/lines", engine.base_url))
            .json(&json!({ "lines": lines }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(outcome.skipped, 0);
        ingested += outcome.ingested;
    }
    assert_eq!(ingested, 50_002);

    let now = Utc::now();
    let report: GapReport = client
        .post(format!("{}/analysis", engine.base_url))
        .json(&json!({
            "from": (now - Duration::hours(1)).to_rfc3339(),
            "to": (now + Duration::hours(1)).to_rfc3339(),
            "teams": ["payments"],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(report.gaps.len(), 1);
    let gap = &report.gaps[0];
    assert_eq!(gap.endpoint.method, "GET");
    assert_eq!(gap.endpoint.endpoint, "/items/{id}");
    assert_eq!(gap.call_volume, 50_002);
    assert!(!gap.has_metric);
    assert!(!gap.has_alert);
    assert_eq!(gap.priority, GapPriority::Critical);

    assert_eq!(report.inputs.records_scanned, 50_002);
    assert_eq!(report.inputs.distinct_endpoints, 1);
    assert!(report.complete());

    engine.shutdown.trigger();
}

/// One team's inventory being down must not fail the run: gaps still come
/// back, with that team annotated unavailable.
#[tokio::test]
async fn test_partial_inventory_failure_keeps_run_alive() {
    let alerts_addr = common::start_scripted_server(|request_line| async move {
        if request_line.contains("team=team-a") {
            (
                200,
                json!({
                    "alerts": [{
                        "id": "team-a-checkout-5xx",
                        "team": "team-a",
                        "target_pattern": "checkout errors 5xx",
                        "severity": "critical",
                    }]
                })
                .to_string(),
            )
        } else {
            (500, "{}".to_string())
        }
    })
    .await;
    let metrics_addr = common::start_json_server(
        200,
        json!({
            "metrics": [{
                "name": "orders_service_request_count",
                "source": "circuit_breaker",
                "last_observed_at": null,
            }]
        })
        .to_string(),
    )
    .await;

    let mut config = GapwatchConfig::default();
    config.ingestion.enabled = false;
    config.inventory.alerts_url = format!("http://{}", alerts_addr);
    config.inventory.metrics_url = format!("http://{}", metrics_addr);
    config.inventory.retry = fast_retry();
    let engine = common::spawn_engine(config).await;
    let client = common::client();

    client
        .post(format!("{}/pods/pod-1/lines", engine.base_url))
        .json(&json!({
            "lines": [
                "POST /checkout 500 30ms",
                "POST /checkout 502 31ms",
                "POST /checkout 200 12ms",
            ]
        }))
        .send()
        .await
        .expect("Engine unreachable");

    let now = Utc::now();
    let res = client
        .post(format!("{}/analysis", engine.base_url))
        .json(&json!({
            "from": (now - Duration::hours(1)).to_rfc3339(),
            "to": (now + Duration::hours(1)).to_rfc3339(),
            "teams": ["team-a", "team-b"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let report: GapReport = res.json().await.unwrap();

    // The run completed on partial data: gaps are present, the unreachable
    // team is marked, the reachable one is fresh.
    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.gaps[0].endpoint.endpoint, "/checkout");
    assert!(!report.complete());

    let freshness_of = |scope: &str| {
        report
            .inventories
            .iter()
            .find(|a| a.inventory == "alerts" && a.scope == scope)
            .map(|a| a.freshness)
            .expect("missing annotation")
    };
    assert_eq!(freshness_of("team-a"), InventoryFreshness::Fresh);
    assert_eq!(freshness_of("team-b"), InventoryFreshness::Unavailable);

    engine.shutdown.trigger();
}
