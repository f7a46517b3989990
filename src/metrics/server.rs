//! Loopback HTTP exporter for pipeline metrics.
//!
//! `/metrics` serves the Prometheus text format, `/stats` the latest
//! snapshot as JSON and `/health` whether a frame is in flight.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors raised while running the exporter.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind metrics exporter: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("metrics exporter failed: {0}")]
    Server(String),
}

/// Where the exporter listens. Always loopback.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Loopback address on `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], port).into(),
        }
    }
}

/// State shared between the UI loop and the HTTP handlers.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: MetricsSnapshot,
}

impl MetricsState {
    /// Pushes a snapshot into the counters and keeps it for `/stats`.
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.latest = snapshot.clone();
    }

    /// Last snapshot received.
    pub fn latest(&self) -> &MetricsSnapshot {
        &self.latest
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// Serves the pipeline metrics over HTTP.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Wraps `registry`; nothing is bound until [`run`](Self::run).
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                latest: MetricsSnapshot::default(),
            })),
        }
    }

    /// Handle for pushing snapshots.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    fn router(state: SharedState) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Binds and serves until the runtime shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics exporter listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn stats_handler(State(state): State<SharedState>) -> Json<MetricsSnapshot> {
    Json(state.read().await.latest.clone())
}

async fn health_handler(State(state): State<SharedState>) -> &'static str {
    if state.read().await.latest.busy {
        "busy"
    } else {
        "idle"
    }
}
