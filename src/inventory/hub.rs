//! Cached, degradable access to the alert and metric inventories.

use chrono::Utc;

use crate::config::InventoryConfig;
use crate::inventory::cache::{InventoryCache, InventoryFreshness};
use crate::inventory::source::{AlertSource, MetricSource};
use crate::model::{AlertDescriptor, MetricDescriptor};
use crate::observability::metrics;
use crate::resilience::{with_retries, RetryPlan};

/// One inventory answer plus how trustworthy it is.
#[derive(Debug, Clone)]
pub struct InventorySnapshot<T> {
    pub items: Vec<T>,
    pub freshness: InventoryFreshness,
}

/// Front door for inventory lookups.
///
/// Lookup order: fresh cache hit, then a retried upstream fetch, then the
/// last good (stale) snapshot, then an empty unavailable answer. A failure
/// for one team or scope never affects another.
#[derive(Debug)]
pub struct InventoryHub {
    alerts: Box<dyn AlertSource>,
    metrics: Box<dyn MetricSource>,
    alert_cache: InventoryCache<AlertDescriptor>,
    metric_cache: InventoryCache<MetricDescriptor>,
    retry: RetryPlan,
}

impl InventoryHub {
    pub fn new(
        alerts: Box<dyn AlertSource>,
        metrics: Box<dyn MetricSource>,
        config: &InventoryConfig,
    ) -> Self {
        Self {
            alerts,
            metrics,
            alert_cache: InventoryCache::new(config.cache_ttl_secs),
            metric_cache: InventoryCache::new(config.cache_ttl_secs),
            retry: config.retry,
        }
    }

    pub async fn alerts_for(&self, team: &str) -> InventorySnapshot<AlertDescriptor> {
        let now = Utc::now();
        if let Some(items) = self.alert_cache.fresh(team, now) {
            metrics::record_inventory_lookup("alerts", "cache");
            return InventorySnapshot {
                items,
                freshness: InventoryFreshness::Fresh,
            };
        }

        match with_retries("alert inventory", &self.retry, || {
            self.alerts.list_alerts(team)
        })
        .await
        {
            Ok(items) => {
                self.alert_cache.store(team, items.clone(), now);
                metrics::record_inventory_lookup("alerts", "fetch");
                InventorySnapshot {
                    items,
                    freshness: InventoryFreshness::Fresh,
                }
            }
            Err(error) => {
                tracing::warn!(team, error = %error, "Alert inventory fetch failed");
                self.degraded(self.alert_cache.last_good(team), "alerts")
            }
        }
    }

    pub async fn metrics_for(&self, scope: &str) -> InventorySnapshot<MetricDescriptor> {
        let now = Utc::now();
        if let Some(items) = self.metric_cache.fresh(scope, now) {
            metrics::record_inventory_lookup("metrics", "cache");
            return InventorySnapshot {
                items,
                freshness: InventoryFreshness::Fresh,
            };
        }

        match with_retries("metric inventory", &self.retry, || {
            self.metrics.list_metrics(scope)
        })
        .await
        {
            Ok(items) => {
                self.metric_cache.store(scope, items.clone(), now);
                metrics::record_inventory_lookup("metrics", "fetch");
                InventorySnapshot {
                    items,
                    freshness: InventoryFreshness::Fresh,
                }
            }
            Err(error) => {
                tracing::warn!(scope, error = %error, "Metric inventory fetch failed");
                self.degraded(self.metric_cache.last_good(scope), "metrics")
            }
        }
    }

    fn degraded<T>(
        &self,
        last_good: Option<(Vec<T>, chrono::DateTime<Utc>)>,
        inventory: &'static str,
    ) -> InventorySnapshot<T> {
        match last_good {
            Some((items, fetched_at)) => {
                metrics::record_inventory_lookup(inventory, "stale");
                InventorySnapshot {
                    items,
                    freshness: InventoryFreshness::Stale { fetched_at },
                }
            }
            None => {
                metrics::record_inventory_lookup(inventory, "unavailable");
                InventorySnapshot {
                    items: Vec::new(),
                    freshness: InventoryFreshness::Unavailable,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::source::SourceError;
    use crate::model::AlertSeverity;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn alert(id: &str) -> AlertDescriptor {
        AlertDescriptor {
            id: id.to_string(),
            team: "payments".to_string(),
            target_pattern: String::new(),
            severity: AlertSeverity::Warning,
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedAlerts {
        fail: AtomicBool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AlertSource for ScriptedAlerts {
        async fn list_alerts(&self, _team: &str) -> Result<Vec<AlertDescriptor>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(SourceError::Status { status: 503 })
            } else {
                Ok(vec![alert("ALR-1")])
            }
        }
    }

    #[derive(Debug, Default)]
    struct EmptyMetrics;

    #[async_trait]
    impl MetricSource for EmptyMetrics {
        async fn list_metrics(&self, _scope: &str) -> Result<Vec<MetricDescriptor>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn hub_config() -> InventoryConfig {
        InventoryConfig {
            retry: RetryPlan {
                attempts: 2,
                timeout_ms: 100,
                backoff_base_ms: 1,
                backoff_max_ms: 2,
            },
            ..InventoryConfig::default()
        }
    }

    fn hub(source: ScriptedAlerts) -> (InventoryHub, std::sync::Arc<ScriptedAlerts>) {
        let source = std::sync::Arc::new(source);
        let hub = InventoryHub::new(
            Box::new(SharedAlerts(source.clone())),
            Box::new(EmptyMetrics),
            &hub_config(),
        );
        (hub, source)
    }

    #[derive(Debug)]
    struct SharedAlerts(std::sync::Arc<ScriptedAlerts>);

    #[async_trait]
    impl AlertSource for SharedAlerts {
        async fn list_alerts(&self, team: &str) -> Result<Vec<AlertDescriptor>, SourceError> {
            self.0.list_alerts(team).await
        }
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let (hub, source) = hub(ScriptedAlerts::default());

        let first = hub.alerts_for("payments").await;
        assert_eq!(first.freshness, InventoryFreshness::Fresh);
        assert_eq!(first.items.len(), 1);

        let second = hub.alerts_for("payments").await;
        assert_eq!(second.freshness, InventoryFreshness::Fresh);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cold_failure_is_unavailable() {
        let scripted = ScriptedAlerts::default();
        scripted.fail.store(true, Ordering::SeqCst);
        let (hub, source) = hub(scripted);

        let snapshot = hub.alerts_for("payments").await;
        assert_eq!(snapshot.freshness, InventoryFreshness::Unavailable);
        assert!(snapshot.items.is_empty());
        // Both retry attempts were spent.
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_after_success_serves_stale() {
        let (hub, source) = hub(ScriptedAlerts::default());

        let fresh = hub.alerts_for("payments").await;
        assert_eq!(fresh.freshness, InventoryFreshness::Fresh);

        // Next lookup must refetch; force it by making a hub with zero TTL.
        let zero_ttl = InventoryConfig {
            cache_ttl_secs: 0,
            ..hub_config()
        };
        let hub = InventoryHub::new(
            Box::new(SharedAlerts(source.clone())),
            Box::new(EmptyMetrics),
            &zero_ttl,
        );
        let seeded = hub.alerts_for("payments").await;
        assert_eq!(seeded.freshness, InventoryFreshness::Fresh);

        source.fail.store(true, Ordering::SeqCst);
        let degraded = hub.alerts_for("payments").await;
        assert!(matches!(
            degraded.freshness,
            InventoryFreshness::Stale { .. }
        ));
        assert_eq!(degraded.items.len(), 1);
    }

    #[tokio::test]
    async fn test_teams_are_isolated() {
        let (hub, source) = hub(ScriptedAlerts::default());

        let ok = hub.alerts_for("payments").await;
        assert_eq!(ok.freshness, InventoryFreshness::Fresh);

        source.fail.store(true, Ordering::SeqCst);
        let down = hub.alerts_for("orders").await;
        assert_eq!(down.freshness, InventoryFreshness::Unavailable);

        // The cached team still answers fresh.
        let still_ok = hub.alerts_for("payments").await;
        assert_eq!(still_ok.freshness, InventoryFreshness::Fresh);
    }
}
