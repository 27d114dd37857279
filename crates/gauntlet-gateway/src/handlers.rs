// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/runs, GET /v1/runs/{id}, GET /health.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gauntlet_engine::RunRequest;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::server::{GatewayState, RunState};

/// Request body for POST /v1/runs.
#[derive(Debug, Deserialize)]
pub struct RunSubmitRequest {
    /// Identity the quiz is solved for (email or similar).
    pub identity: String,
    /// Shared secret authenticating the caller.
    pub secret: String,
    /// First stage URL.
    pub url: String,
}

/// Response body for POST /v1/runs.
#[derive(Debug, Serialize)]
pub struct RunSubmitResponse {
    pub run_id: String,
    pub status: String,
}

/// Response body for GET /v1/runs/{id}.
#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    pub run_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<gauntlet_core::types::RunReport>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /v1/runs
///
/// Validates the shared secret, then starts the run on a background task
/// and replies immediately with the run id. When no secret is configured
/// every request is rejected (fail-closed).
pub async fn post_runs(
    State(state): State<GatewayState>,
    Json(body): Json<RunSubmitRequest>,
) -> Response {
    let Some(ref expected_secret) = state.shared_secret else {
        tracing::error!("gateway has no shared secret configured -- rejecting request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "no shared secret configured".into(),
            }),
        )
            .into_response();
    };

    if body.secret != *expected_secret {
        warn!(identity = body.identity.as_str(), "invalid secret; access denied");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "invalid secret".into(),
            }),
        )
            .into_response();
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    info!(
        run_id = run_id.as_str(),
        identity = body.identity.as_str(),
        url = body.url.as_str(),
        "run accepted; solving in the background"
    );

    state.runs.insert(run_id.clone(), RunState::Running);

    let engine = state.engine.clone();
    let runs = state.runs.clone();
    let task_run_id = run_id.clone();
    let request = RunRequest {
        identity: body.identity,
        secret: body.secret,
        start_url: body.url,
    };
    tokio::spawn(async move {
        let report = engine.run(&request).await;
        info!(
            run_id = task_run_id.as_str(),
            status = %report.status,
            stages = report.stages_completed,
            "run finished"
        );
        runs.insert(task_run_id, RunState::Done(report));
    });

    (
        StatusCode::ACCEPTED,
        Json(RunSubmitResponse {
            run_id,
            status: "running".into(),
        }),
    )
        .into_response()
}

/// GET /v1/runs/{id}
pub async fn get_run(
    State(state): State<GatewayState>,
    Path(run_id): Path<String>,
) -> Response {
    match state.runs.get(&run_id).map(|entry| entry.value().clone()) {
        Some(RunState::Running) => (
            StatusCode::OK,
            Json(RunStatusResponse {
                run_id,
                status: "running".into(),
                report: None,
            }),
        )
            .into_response(),
        Some(RunState::Done(report)) => (
            StatusCode::OK,
            Json(RunStatusResponse {
                run_id,
                status: report.status.to_string(),
                report: Some(report),
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown run id {run_id}"),
            }),
        )
            .into_response(),
    }
}

/// GET /health -- process liveness only, unauthenticated.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
        .into_response()
}
