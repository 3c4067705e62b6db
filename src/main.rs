//! Monitoring Coverage Gap Engine
//!
//! Correlates observed API traffic with metric and alert inventories to
//! surface endpoints that carry traffic but lack monitoring.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌─────────────────────────────────────────────────────────┐
//!                              │                     GAP ENGINE                           │
//!                              │                                                          │
//!     Pod log streams          │  ┌─────────┐    ┌─────────┐    ┌──────────────┐         │
//!     ─────────────────────────┼─▶│ingestion│───▶│ parser  │───▶│  pool store  │         │
//!     (poll or push)           │  │ workers │    │normalize│    │  (segments)  │         │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘         │
//!                              │                                       │                  │
//!                              │                                       ▼                  │
//!     Alert inventory ─────────┼──▶┌──────────────┐            ┌──────────────┐          │
//!                              │   │  inventory   │───────────▶│ correlation  │          │
//!     Metric inventory ────────┼──▶│ hub (cached) │            │  + analysis  │          │
//!                              │   └──────────────┘            └──────┬───────┘          │
//!                              │                                       │                  │
//!     Gap reports              │  ┌─────────┐    ┌─────────┐          │                  │
//!     ◀────────────────────────┼──│  JSON   │◀───│  http   │◀─────────┘                  │
//!                              │  │ replies │    │  api    │                              │
//!                              │  └─────────┘    └─────────┘                              │
//!                              │                                                          │
//!                              │  ┌────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                 │ │
//!                              │  │  ┌─────────┐ ┌────────┐ ┌──────────┐ ┌───────────┐ │ │
//!                              │  │  │ config  │ │retention│ │observa-  │ │resilience │ │ │
//!                              │  │  │ +reload │ │eviction │ │ bility   │ │retry/backoff│ │
//!                              │  │  └─────────┘ └────────┘ └──────────┘ └───────────┘ │ │
//!                              │  │  ┌─────────────────────────────────────────────┐   │ │
//!                              │  │  │          lifecycle (signals/shutdown)        │   │ │
//!                              │  │  └─────────────────────────────────────────────┘   │ │
//!                              │  └────────────────────────────────────────────────────┘ │
//!                              └─────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use clap::Parser;
use tokio::net::TcpListener;

use gapwatch::config::{load_config, ConfigWatcher, GapwatchConfig};
use gapwatch::http::{ApiServer, AppState};
use gapwatch::ingestion::{spawn_eviction_timer, spawn_workers, HttpLogSource, LogSource};
use gapwatch::inventory::{HttpAlertSource, HttpMetricSource, InventoryHub};
use gapwatch::lifecycle::{shutdown_signal, Shutdown};
use gapwatch::observability::{init_logging, init_metrics};
use gapwatch::parser::LineParser;
use gapwatch::pool::{PoolStore, RetentionPolicy};

#[derive(Debug, Parser)]
#[command(name = "gapwatch", about = "Monitoring coverage gap engine")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration before logging so the configured level applies.
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GapwatchConfig::default(),
    };

    init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gapwatch starting");
    tracing::info!(
        bind_address = %config.http.bind_address,
        tracked_pods = config.ingestion.pods.len(),
        max_records = config.retention.max_records,
        max_age_days = config.retention.max_age_days,
        "Configuration loaded"
    );

    // Core state: pool store, parser, inventory hub.
    let policy = RetentionPolicy::from(&config.retention);
    let pool = Arc::new(PoolStore::new(&config.pool, policy)?);
    let parser = Arc::new(ArcSwap::from_pointee(LineParser::from_config(&config.parser)));

    let alerts = Box::new(HttpAlertSource::new(&config.inventory.alerts_url));
    let metric_source = Box::new(HttpMetricSource::new(&config.inventory.metrics_url));
    let inventories = Arc::new(InventoryHub::new(alerts, metric_source, &config.inventory));

    // Background tasks: one worker per tracked pod plus the eviction timer.
    let shutdown = Arc::new(Shutdown::new());
    let log_source: Arc<dyn LogSource> = Arc::new(HttpLogSource::new(&config.ingestion.logs_url));
    spawn_workers(
        &config.ingestion,
        log_source,
        parser.load_full(),
        pool.clone(),
        &shutdown,
    );
    spawn_eviction_timer(&config.retention, pool.clone(), &shutdown);

    // Metrics exposition on its own address.
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shared_config = Arc::new(ArcSwap::from_pointee(config));

    // Hot reload: watch the config file and swap the shared handle. The
    // watcher handle must stay alive for the callbacks to fire.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;

            let shared_config = shared_config.clone();
            let parser = parser.clone();
            let pool = pool.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    pool.set_policy(RetentionPolicy::from(&new_config.retention));
                    parser.store(Arc::new(LineParser::from_config(&new_config.parser)));
                    shared_config.store(Arc::new(new_config));
                    tracing::info!("Configuration reloaded");
                }
            });
            Some(handle)
        }
        None => None,
    };

    // Translate OS signals into the shutdown broadcast.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.trigger();
        });
    }

    let bind_address = shared_config.load().http.bind_address.clone();
    let listener = TcpListener::bind(&bind_address).await?;

    let state = AppState {
        config: shared_config,
        pool,
        inventories,
        parser,
        started_at: Utc::now(),
    };
    let server = ApiServer::new(state);
    server.run(listener, shutdown.subscribe()).await?;

    // Workers and the eviction timer exit on the same broadcast.
    let remaining = shutdown.drain(Duration::from_secs(10)).await;
    if remaining > 0 {
        tracing::warn!(tasks = remaining, "Shutdown deadline passed with tasks still running");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
