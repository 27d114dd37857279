// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the service entry
//! point: run submission, run status lookup, and a liveness probe.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use gauntlet_core::types::RunReport;
use gauntlet_core::GauntletError;
use gauntlet_engine::StageOrchestrator;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

/// Lifecycle of one accepted run.
#[derive(Debug, Clone)]
pub enum RunState {
    Running,
    Done(RunReport),
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Map of run_id -> run lifecycle, shared with background tasks.
    pub runs: Arc<DashMap<String, RunState>>,
    /// The engine runs execute on.
    pub engine: Arc<StageOrchestrator>,
    /// Shared secret expected in run requests; `None` rejects everything.
    pub shared_secret: Option<String>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(engine: Arc<StageOrchestrator>, shared_secret: Option<String>) -> Self {
        Self {
            runs: Arc::new(DashMap::new()),
            engine,
            shared_secret,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/runs", post(handlers::post_runs))
        .route("/v1/runs/{id}", get(handlers::get_run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway server and serve until the process exits.
pub async fn start_server(
    host: &str,
    port: u16,
    state: GatewayState,
) -> Result<(), GauntletError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GauntletError::Internal(format!("failed to bind {addr}: {e}")))?;

    info!(addr = addr.as_str(), "gateway listening");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| GauntletError::Internal(format!("server error: {e}")))
}
