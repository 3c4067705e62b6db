//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gapwatch::config::GapwatchConfig;
use gapwatch::http::{ApiServer, AppState};
use gapwatch::inventory::{HttpAlertSource, HttpMetricSource, InventoryHub};
use gapwatch::lifecycle::Shutdown;
use gapwatch::parser::LineParser;
use gapwatch::pool::{PoolStore, RetentionPolicy};

/// A running engine instance bound to an ephemeral port.
pub struct Engine {
    pub base_url: String,
    pub shutdown: Arc<Shutdown>,
}

/// Spin up the full engine (API server over real subsystems) for a test.
/// Polling workers are not started; tests push lines over the API.
pub async fn spawn_engine(config: GapwatchConfig) -> Engine {
    let policy = RetentionPolicy::from(&config.retention);
    let pool = Arc::new(PoolStore::new(&config.pool, policy).unwrap());
    let parser = Arc::new(ArcSwap::from_pointee(LineParser::from_config(&config.parser)));

    let alerts = Box::new(HttpAlertSource::new(&config.inventory.alerts_url));
    let metrics = Box::new(HttpMetricSource::new(&config.inventory.metrics_url));
    let inventories = Arc::new(InventoryHub::new(alerts, metrics, &config.inventory));

    let shutdown = Arc::new(Shutdown::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState {
        config: Arc::new(ArcSwap::from_pointee(config)),
        pool,
        inventories,
        parser,
        started_at: Utc::now(),
    };
    let server = ApiServer::new(state);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Engine {
        base_url: format!("http://{}", addr),
        shutdown,
    }
}

/// HTTP client configured for test stability.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock upstream that answers every request with the given status
/// and JSON body, regardless of path.
pub async fn start_json_server(status: u16, body: String) -> SocketAddr {
    start_scripted_server(move |_request_line| {
        let body = body.clone();
        async move { (status, body) }
    })
    .await
}

/// Start a programmable mock upstream. The handler receives the request
/// line (e.g. `GET /alerts?team=a&page=1 HTTP/1.1`) and returns the status
/// and JSON body to answer with.
pub async fn start_scripted_server<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let request_line = head.lines().next().unwrap_or("").to_string();

                        let (status, body) = handler(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
