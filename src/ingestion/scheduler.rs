//! Background task wiring: pod workers and the eviction timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use crate::config::{IngestionConfig, RetentionConfig};
use crate::ingestion::source::LogSource;
use crate::ingestion::worker::PodWorker;
use crate::lifecycle::Shutdown;
use crate::parser::LineParser;
use crate::pool::PoolStore;

/// Spawn one polling worker per tracked pod.
///
/// Returns the join handles; an empty pod list (push-only deployments that
/// rely on the submit endpoint) spawns nothing.
pub fn spawn_workers(
    config: &IngestionConfig,
    source: Arc<dyn LogSource>,
    parser: Arc<LineParser>,
    pool: Arc<PoolStore>,
    shutdown: &Shutdown,
) -> Vec<JoinHandle<()>> {
    if !config.enabled {
        tracing::info!("Log polling disabled");
        return Vec::new();
    }

    let mut handles = Vec::with_capacity(config.pods.len());
    for pod in &config.pods {
        let worker = PodWorker::new(
            pod.clone(),
            source.clone(),
            parser.clone(),
            pool.clone(),
            config,
        );
        handles.push(tokio::spawn(worker.run(shutdown.subscribe())));
    }
    if handles.is_empty() {
        tracing::info!("No pods configured for polling; ingestion via submit endpoint only");
    }
    handles
}

/// Spawn the eviction timer.
///
/// Runs on its own schedule, decoupled from ingestion and analysis; each
/// tick applies whatever policy the pool currently holds, so a config
/// reload takes effect at the next tick.
pub fn spawn_eviction_timer(
    config: &RetentionConfig,
    pool: Arc<PoolStore>,
    shutdown: &Shutdown,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(config.eviction_interval_secs.max(1));
    let mut receiver = shutdown.subscribe();
    tokio::spawn(async move {
        tracing::info!(
            interval_secs = interval.as_secs(),
            "Eviction timer starting"
        );
        let mut ticker = time::interval(interval);
        // The first tick fires immediately; skip it so startup replay is
        // not evicted before anyone could query it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let policy = pool.policy();
                    let stats = pool.evict(&policy);
                    crate::observability::metrics::record_eviction(&stats);
                }
                _ = receiver.recv() => {
                    tracing::info!("Eviction timer received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}
