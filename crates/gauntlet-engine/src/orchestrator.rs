// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-stage FSM and the sequential run loop.
//!
//! Each stage goes through states: Fetched -> Classified ->
//! (DeterministicTried) -> LlmAttempting -> Formatted -> Submitted ->
//! Advanced | Failed. Stages are strictly sequential: the next URL is only
//! discoverable from the previous stage's accepted submission.
//!
//! The stage loop integrates:
//! - **Classifier/planner**: tier assigned once per stage, reused for every
//!   retry; the model plan is recomputed per attempt as time drains
//! - **Deterministic solver**: a free closed-form probe before any backend
//!   spend
//! - **Invoker**: bounded attempts, each enriched with all prior failure
//!   feedback
//! - **Formatter**: stage-declared format contract applied before submission
//! - **Deadline**: checked before every attempt; no new attempt starts once
//!   the budget is gone

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use gauntlet_classify::{ModelPlanner, StageClassifier};
use gauntlet_core::types::{
    AttemptRecord, PromptVariant, RunReport, StageOutcome, StageResult, StructuredAnswer,
};
use gauntlet_core::{AnswerBoard, GauntletError, StageFetcher, Submission};
use strum::Display;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::alphametic;
use crate::format::format_answer;
use crate::invoker::{InvokeSuccess, Invoker};
use crate::submit::discover_submit_url;

/// Base per-attempt timeout for stages with binary media, in seconds.
const MULTIMODAL_ATTEMPT_SECS: f64 = 30.0;

/// Base per-attempt timeout for text-only stages, in seconds.
const TEXT_ATTEMPT_SECS: f64 = 20.0;

/// Remaining stage time below which emergency timeouts kick in, in seconds.
const EMERGENCY_WINDOW_SECS: f64 = 30.0;

/// Emergency-mode ceiling on a single attempt, in seconds.
const EMERGENCY_ATTEMPT_SECS: f64 = 15.0;

/// Attempts shorter than this are not worth starting, in seconds.
const MIN_ATTEMPT_SECS: f64 = 1.0;

/// Engine knobs surfaced through configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Hard time budget per stage.
    pub stage_deadline: Duration,
    /// Backend attempt ceiling per stage.
    pub max_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stage_deadline: Duration::from_secs(120),
            max_attempts: 3,
        }
    }
}

/// One run request: who is solving, with what credential, from which URL.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub identity: String,
    pub secret: String,
    pub start_url: String,
}

/// States in the per-stage FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
enum StageState {
    Fetched,
    Classified,
    DeterministicTried,
    LlmAttempting,
    Formatted,
    Submitted,
    Advanced,
    Failed,
}

/// Terminal outcome of one stage, internal to the run loop.
enum StageEnd {
    Advanced {
        answer: String,
        next_url: Option<String>,
        attempts: u32,
    },
    Failed {
        reason: String,
        attempts: u32,
    },
    Fatal {
        error: GauntletError,
    },
}

/// Drives a whole quiz run, stage by stage.
pub struct StageOrchestrator {
    fetcher: Arc<dyn StageFetcher>,
    board: Arc<dyn AnswerBoard>,
    invoker: Invoker,
    classifier: StageClassifier,
    planner: ModelPlanner,
    config: OrchestratorConfig,
}

impl StageOrchestrator {
    pub fn new(
        fetcher: Arc<dyn StageFetcher>,
        board: Arc<dyn AnswerBoard>,
        invoker: Invoker,
        planner: ModelPlanner,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            fetcher,
            board,
            invoker,
            classifier: StageClassifier::new(),
            planner,
            config,
        }
    }

    /// Run the chained quiz from the request's starting URL to completion
    /// or first failure.
    pub async fn run(&self, request: &RunRequest) -> RunReport {
        self.run_with_ledger(request).await.0
    }

    /// Like [`run`](Self::run), additionally returning the per-stage ledger.
    pub async fn run_with_ledger(&self, request: &RunRequest) -> (RunReport, Vec<StageResult>) {
        let run_start = Instant::now();
        let mut ledger: Vec<StageResult> = Vec::new();
        let mut current_url = request.start_url.clone();

        loop {
            info!(
                stage = ledger.len() + 1,
                url = current_url.as_str(),
                budget_secs = self.config.stage_deadline.as_secs(),
                "starting stage"
            );
            let stage_start = Instant::now();

            match self.solve_stage(&current_url, request).await {
                StageEnd::Advanced {
                    answer,
                    next_url,
                    attempts,
                } => {
                    let elapsed = stage_start.elapsed();
                    info!(
                        url = current_url.as_str(),
                        attempts,
                        elapsed_secs = elapsed.as_secs_f64(),
                        "stage solved"
                    );
                    ledger.push(StageResult {
                        url: current_url.clone(),
                        outcome: StageOutcome::Solved {
                            answer: answer.clone(),
                            elapsed,
                            attempts,
                        },
                    });
                    match next_url {
                        Some(next) => current_url = next,
                        None => {
                            let completed = ledger.len();
                            info!(stages = completed, "quiz sequence complete");
                            let report =
                                RunReport::success(answer, completed, run_start.elapsed());
                            return (report, ledger);
                        }
                    }
                }
                StageEnd::Failed { reason, attempts } => {
                    warn!(
                        url = current_url.as_str(),
                        reason = reason.as_str(),
                        "stage failed; run ends"
                    );
                    let completed = ledger.len();
                    ledger.push(StageResult {
                        url: current_url.clone(),
                        outcome: StageOutcome::Failed {
                            reason: reason.clone(),
                            attempts,
                        },
                    });
                    let report = RunReport::failure(
                        reason,
                        current_url,
                        completed,
                        run_start.elapsed(),
                    );
                    return (report, ledger);
                }
                StageEnd::Fatal { error } => {
                    error!(error = %error, "fatal error; aborting run");
                    let completed = ledger.len();
                    let report = RunReport::failure(
                        format!("fatal: {error}"),
                        current_url,
                        completed,
                        run_start.elapsed(),
                    );
                    return (report, ledger);
                }
            }
        }
    }

    async fn solve_stage(&self, url: &str, request: &RunRequest) -> StageEnd {
        let deadline = Instant::now() + self.config.stage_deadline;
        let mut state = StageState::Fetched;

        let document = match self.fetcher.fetch_stage(url).await {
            Ok(document) => document,
            Err(error) if error.is_fatal() => return StageEnd::Fatal { error },
            Err(error) => {
                return StageEnd::Failed {
                    reason: format!("stage fetch failed: {error}"),
                    attempts: 0,
                };
            }
        };
        let mut payload = document.payload;

        // Gather auxiliary resources concurrently; results are joined into
        // the payload before classification proceeds.
        if !document.aux_links.is_empty() {
            let fetches = document
                .aux_links
                .iter()
                .map(|link| self.fetcher.fetch_resource(link));
            let results = future::join_all(fetches).await;
            for (link, result) in document.aux_links.iter().zip(results) {
                match result {
                    Ok(body) => {
                        payload
                            .text
                            .push_str(&format!("\n\n=== ADDITIONAL DATA FROM {link} ===\n{body}"));
                    }
                    Err(error) => warn!(
                        link = link.as_str(),
                        error = %error,
                        "auxiliary fetch failed; continuing without it"
                    ),
                }
            }
        }

        transition(&mut state, StageState::Classified, url);
        let classification = self.classifier.classify(&payload);
        info!(
            tier = %classification.tier,
            category = %classification.category,
            reason = classification.reason,
            modality = %payload.dominant_modality(),
            "stage classified"
        );

        let submit_url = discover_submit_url(&payload.text, &document.aux_links, url);
        let hint_content = payload.textual_content();
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut llm_attempts = 0u32;

        // Free closed-form probe before paying for a backend call. A
        // validated hit skips straight to formatting and submission.
        if let Some(ref canvas) = payload.canvas {
            transition(&mut state, StageState::DeterministicTried, url);
            if let Some(answer) = alphametic::solve_canvas(canvas) {
                info!(answer = answer.as_str(), "closed-form solution validated");
                transition(&mut state, StageState::Formatted, url);
                let formatted = format_answer(&answer, &hint_content);
                transition(&mut state, StageState::Submitted, url);
                let submission =
                    build_submission(request, url, &formatted, "validated closed-form solution");
                match self.board.submit(&submit_url, &submission).await {
                    Ok(verdict) if verdict.correct => {
                        transition(&mut state, StageState::Advanced, url);
                        return StageEnd::Advanced {
                            answer: formatted,
                            next_url: verdict.next_url,
                            attempts: 0,
                        };
                    }
                    Ok(verdict) => {
                        let reason = verdict
                            .reason
                            .unwrap_or_else(|| "no specific reason provided".to_string());
                        warn!(
                            reason = reason.as_str(),
                            "closed-form answer rejected; falling back to backend"
                        );
                        push_attempt(
                            &mut attempts,
                            None,
                            None,
                            format!("Reason: {reason}. Submitted: {formatted}"),
                        );
                    }
                    Err(error) => {
                        warn!(error = %error, "submission failed for closed-form answer");
                        push_attempt(
                            &mut attempts,
                            None,
                            None,
                            format!("Reason: submission failed ({error})"),
                        );
                    }
                }
            } else {
                debug!("canvas not solvable in closed form; using backend");
            }
        }

        while llm_attempts < self.config.max_attempts {
            // Deadline gate: no new attempt starts once the budget is gone.
            let remaining = deadline.duration_since(Instant::now());
            let attempts_left = self.config.max_attempts - llm_attempts;
            let Some(timeout) = attempt_timeout(remaining, payload.is_textual(), attempts_left)
            else {
                transition(&mut state, StageState::Failed, url);
                return StageEnd::Failed {
                    reason: format!(
                        "stage deadline exhausted after {llm_attempts} of {} attempts",
                        self.config.max_attempts
                    ),
                    attempts: llm_attempts,
                };
            };
            if remaining.as_secs_f64() < EMERGENCY_WINDOW_SECS {
                warn!(
                    remaining_secs = remaining.as_secs_f64(),
                    timeout_secs = timeout.as_secs_f64(),
                    "emergency mode: minimal attempt timeout"
                );
            }

            transition(&mut state, StageState::LlmAttempting, url);
            llm_attempts += 1;
            let plan = self.planner.plan(&classification, &payload, remaining);

            match tokio::time::timeout(timeout, self.invoker.invoke(&payload, &plan, &attempts))
                .await
            {
                Err(_) => {
                    warn!(
                        attempt = llm_attempts,
                        timeout_secs = timeout.as_secs_f64(),
                        "attempt timed out"
                    );
                    push_attempt(
                        &mut attempts,
                        None,
                        None,
                        "Reason: attempt timed out -- be faster and more direct".to_string(),
                    );
                }
                Ok(Err(error)) if error.is_fatal() => return StageEnd::Fatal { error },
                Ok(Err(GauntletError::SchemaParse { message, raw })) => {
                    warn!(attempt = llm_attempts, "schema parse failure");
                    push_attempt(&mut attempts, Some(raw), None, message);
                }
                Ok(Err(error)) => {
                    warn!(attempt = llm_attempts, error = %error, "backend attempt failed");
                    push_attempt(
                        &mut attempts,
                        None,
                        None,
                        format!("Reason: backend error ({error})"),
                    );
                }
                Ok(Ok(InvokeSuccess { answer, raw })) => {
                    transition(&mut state, StageState::Formatted, url);
                    let formatted = format_answer(&answer.answer, &hint_content);
                    transition(&mut state, StageState::Submitted, url);
                    let submission =
                        build_submission(request, url, &formatted, &answer.reasoning);
                    match self.board.submit(&submit_url, &submission).await {
                        Ok(verdict) if verdict.correct => {
                            transition(&mut state, StageState::Advanced, url);
                            return StageEnd::Advanced {
                                answer: formatted,
                                next_url: verdict.next_url,
                                attempts: llm_attempts,
                            };
                        }
                        Ok(verdict) => {
                            let reason = verdict
                                .reason
                                .unwrap_or_else(|| "no specific reason provided".to_string());
                            warn!(
                                attempt = llm_attempts,
                                reason = reason.as_str(),
                                "submission rejected; retrying with feedback"
                            );
                            push_attempt(
                                &mut attempts,
                                Some(raw),
                                Some(answer),
                                format!("Reason: {reason}. Submitted: {formatted}"),
                            );
                        }
                        Err(error) => {
                            warn!(
                                attempt = llm_attempts,
                                error = %error,
                                "submission transport failure"
                            );
                            push_attempt(
                                &mut attempts,
                                Some(raw),
                                Some(answer),
                                format!("Reason: submission failed ({error})"),
                            );
                        }
                    }
                }
            }
        }

        transition(&mut state, StageState::Failed, url);
        let last = attempts
            .last()
            .map(|a| a.feedback.clone())
            .unwrap_or_else(|| "no attempts were possible".to_string());
        StageEnd::Failed {
            reason: format!(
                "all {} attempts exhausted; last failure: {last}",
                self.config.max_attempts
            ),
            attempts: llm_attempts,
        }
    }
}

/// Compute the adaptive timeout for the next attempt, or `None` when there
/// is not enough time left to start one.
fn attempt_timeout(remaining: Duration, textual: bool, attempts_left: u32) -> Option<Duration> {
    let remaining_secs = remaining.as_secs_f64();
    let base = if textual {
        TEXT_ATTEMPT_SECS
    } else {
        MULTIMODAL_ATTEMPT_SECS
    };

    let mut timeout = base.min(remaining_secs / (f64::from(attempts_left) + 1.0));
    if remaining_secs < EMERGENCY_WINDOW_SECS {
        timeout = EMERGENCY_ATTEMPT_SECS.min(remaining_secs / 2.0);
    }

    if timeout < MIN_ATTEMPT_SECS {
        None
    } else {
        Some(Duration::from_secs_f64(timeout))
    }
}

fn push_attempt(
    attempts: &mut Vec<AttemptRecord>,
    raw_output: Option<String>,
    parsed: Option<StructuredAnswer>,
    feedback: String,
) {
    let attempt = attempts.len() as u32 + 1;
    let variant = if attempts.is_empty() {
        PromptVariant::Initial
    } else {
        PromptVariant::Feedback
    };
    attempts.push(AttemptRecord {
        attempt,
        variant,
        raw_output,
        parsed,
        feedback,
    });
}

fn build_submission(request: &RunRequest, url: &str, answer: &str, reasoning: &str) -> Submission {
    Submission {
        identity: request.identity.clone(),
        secret: request.secret.clone(),
        url: url.to_string(),
        answer: answer.to_string(),
        reasoning: reasoning.to_string(),
    }
}

fn transition(state: &mut StageState, to: StageState, url: &str) {
    debug!(url, from = %state, to = %to, "stage transition");
    *state = to;
}
