// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `gauntlet serve` and `gauntlet run` command implementations.
//!
//! Assembles the engine from configuration: the sliding-window rate
//! limiter, the configured backend (Gemini, or the in-process mock for test
//! runs), the plain-HTTP fetch/board adapters, and the stage orchestrator.

use std::sync::Arc;
use std::time::Duration;

use gauntlet_classify::ModelPlanner;
use gauntlet_config::{BackendKind, GauntletConfig};
use gauntlet_core::{GauntletError, QuizBackend};
use gauntlet_engine::{
    HttpBoard, HttpFetcher, Invoker, OrchestratorConfig, RunRequest, StageOrchestrator,
};
use gauntlet_gateway::GatewayState;
use gauntlet_gemini::GeminiBackend;
use gauntlet_limits::{QuotaLimits, RateLimiter};
use gauntlet_test_utils::MockBackend;
use tracing::info;

/// Initializes the tracing subscriber from the configured log level.
///
/// `RUST_LOG` wins over the config value when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gauntlet={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Build the stage orchestrator from configuration.
fn build_engine(config: &GauntletConfig) -> Result<Arc<StageOrchestrator>, GauntletError> {
    let limiter = Arc::new(RateLimiter::new(QuotaLimits {
        rpm: config.limits.rpm,
        tpm: config.limits.tpm,
        rpd: config.limits.rpd,
    }));

    let backend: Arc<dyn QuizBackend> = match config.backend.kind {
        BackendKind::Gemini => {
            let api_key = config
                .backend
                .api_key
                .clone()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .unwrap_or_default();
            Arc::new(GeminiBackend::new(&api_key)?)
        }
        BackendKind::Mock => {
            info!("mock backend selected; no external API calls will be made");
            Arc::new(MockBackend::new())
        }
    };

    let invoker = Invoker::new(backend, limiter);
    let fetcher = Arc::new(HttpFetcher::new()?);
    let board = Arc::new(HttpBoard::new()?);
    let planner = ModelPlanner::new(
        config.backend.model.clone(),
        config.backend.fast_model.clone(),
    );
    let orchestrator_config = OrchestratorConfig {
        stage_deadline: Duration::from_secs(config.engine.stage_deadline_secs),
        max_attempts: config.engine.max_attempts,
    };

    Ok(Arc::new(StageOrchestrator::new(
        fetcher,
        board,
        invoker,
        planner,
        orchestrator_config,
    )))
}

/// Runs the `gauntlet serve` command.
pub async fn run_serve(config: GauntletConfig) -> Result<(), GauntletError> {
    let engine = build_engine(&config)?;
    let state = GatewayState::new(engine, config.gateway.shared_secret.clone());

    info!(
        host = config.gateway.host.as_str(),
        port = config.gateway.port,
        backend = ?config.backend.kind,
        "starting gateway"
    );

    gauntlet_gateway::start_server(&config.gateway.host, config.gateway.port, state).await
}

/// Runs the `gauntlet run` command: one quiz chain, report printed as JSON.
pub async fn run_once(
    config: GauntletConfig,
    url: String,
    identity: String,
    secret: String,
) -> Result<(), GauntletError> {
    let engine = build_engine(&config)?;
    let request = RunRequest {
        identity,
        secret,
        start_url: url,
    };

    let report = engine.run(&request).await;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| GauntletError::Internal(format!("failed to render report: {e}")))?;
    println!("{rendered}");
    Ok(())
}
