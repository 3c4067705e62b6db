//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limits)
//! - Bind server to listener
//! - Serve until the shutdown channel fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GapwatchConfig, HttpConfig};
use crate::http::handlers;
use crate::inventory::InventoryHub;
use crate::parser::LineParser;
use crate::pool::PoolStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration; swapped atomically on reload.
    pub config: Arc<ArcSwap<GapwatchConfig>>,
    pub pool: Arc<PoolStore>,
    pub inventories: Arc<InventoryHub>,
    /// Live parser; rebuilt and swapped when parser config changes.
    pub parser: Arc<ArcSwap<LineParser>>,
    pub started_at: DateTime<Utc>,
}

/// HTTP server for the management API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a new API server over the shared state.
    pub fn new(state: AppState) -> Self {
        let http = state.config.load().http.clone();
        let router = Self::build_router(&http, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        Router::new()
            .route("/pods/{pod}/lines", post(handlers::submit_lines))
            .route("/pool", get(handlers::query_pool))
            .route("/analysis", post(handlers::run_analysis))
            .route("/status", get(handlers::status))
            .route("/retention", get(handlers::retention))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once the shutdown channel fires and in-flight requests have
    /// completed.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "API server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}
