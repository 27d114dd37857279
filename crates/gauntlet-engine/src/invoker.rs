// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend invocation with admission control, error feedback, and salvage.
//!
//! One `invoke` call is one logical attempt: it passes rate-limiter
//! admission sized to the tier budget, sends the structured-output request,
//! and interprets the reply. Transient overloads are retried here with
//! exponential backoff, re-acquiring admission for every physical request.
//! Prior-attempt failures are appended to the prompt verbatim so the model
//! is told exactly what was rejected and why.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use gauntlet_classify::{ModelPlan, TaskCategory};
use gauntlet_core::types::{AttemptRecord, StagePayload, StructuredAnswer};
use gauntlet_core::{BackendReply, BackendRequest, Finish, GauntletError, QuizBackend};
use gauntlet_limits::RateLimiter;
use regex::Regex;
use tracing::{debug, warn};

/// Physical requests per logical attempt when the backend reports overload.
const MAX_OVERLOAD_RETRIES: u32 = 3;

/// Backoff ceiling between overload retries.
const BACKOFF_CAP_SECS: u64 = 5;

/// Byte cap on condensed stage content in the prompt.
const PROMPT_CONTENT_CAP: usize = 12_000;

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static MULTI_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Complete quoted `answer` field inside (possibly truncated) JSON.
static ANSWER_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""answer"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Complete quoted `reasoning` field inside (possibly truncated) JSON.
static REASONING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""reasoning"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// A structurally valid backend result.
#[derive(Debug, Clone)]
pub struct InvokeSuccess {
    pub answer: StructuredAnswer,
    /// The raw reply text the answer was parsed from.
    pub raw: String,
}

/// Sends structured-output requests under rate-limiter admission.
pub struct Invoker {
    backend: Arc<dyn QuizBackend>,
    limiter: Arc<RateLimiter>,
    overload_retries: u32,
}

impl Invoker {
    pub fn new(backend: Arc<dyn QuizBackend>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            backend,
            limiter,
            overload_retries: MAX_OVERLOAD_RETRIES,
        }
    }

    /// Override the physical-request ceiling per logical attempt.
    pub fn with_overload_retries(self, overload_retries: u32) -> Self {
        Self {
            overload_retries,
            ..self
        }
    }

    /// One logical attempt against the backend.
    ///
    /// Every physical request passes limiter admission; overloads back off
    /// exponentially (2s, 4s, capped at 5s) up to the retry ceiling. The
    /// result is either a schema-conforming answer or an error for the
    /// stage loop to fold into the next attempt's context -- never a
    /// fabricated answer.
    pub async fn invoke(
        &self,
        payload: &StagePayload,
        plan: &ModelPlan,
        attempts: &[AttemptRecord],
    ) -> Result<InvokeSuccess, GauntletError> {
        let system = build_system(plan.category);
        let prompt = build_prompt(payload, attempts);
        let estimated_tokens = estimate_tokens(&system, &prompt, plan.max_output_tokens);

        let mut overload_attempt = 0u32;
        loop {
            self.limiter.acquire(estimated_tokens).await?;

            debug!(
                backend = self.backend.name(),
                model = plan.model.as_str(),
                tier = %plan.tier,
                category = %plan.category,
                prompt_chars = prompt.len(),
                prior_attempts = attempts.len(),
                "invoking backend"
            );

            let request = BackendRequest {
                model: plan.model.clone(),
                system: system.clone(),
                prompt: prompt.clone(),
                max_output_tokens: plan.max_output_tokens,
            };

            match self.backend.generate(request).await {
                Ok(reply) => return interpret_reply(reply),
                Err(err) if err.is_transient() => {
                    overload_attempt += 1;
                    if overload_attempt >= self.overload_retries {
                        return Err(err);
                    }
                    let delay =
                        Duration::from_secs(2u64.pow(overload_attempt).min(BACKOFF_CAP_SECS));
                    warn!(
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "backend overloaded; backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Interpret a raw reply, salvaging truncated JSON when the output hit the
/// token ceiling.
fn interpret_reply(reply: BackendReply) -> Result<InvokeSuccess, GauntletError> {
    let cleaned = strip_code_fences(&reply.text);

    match serde_json::from_str::<StructuredAnswer>(cleaned) {
        Ok(answer) => Ok(InvokeSuccess {
            answer,
            raw: reply.text,
        }),
        Err(parse_err) => {
            if reply.finish == Finish::MaxTokens {
                if let Some(answer) = salvage_truncated(cleaned) {
                    debug!("salvaged structured answer from truncated output");
                    return Ok(InvokeSuccess {
                        answer,
                        raw: reply.text,
                    });
                }
            }
            let message = match reply.finish {
                Finish::MaxTokens => format!(
                    "Reason: output hit the token ceiling and could not be salvaged ({parse_err})"
                ),
                _ => format!("Reason: response was not valid schema JSON ({parse_err})"),
            };
            Err(GauntletError::SchemaParse {
                message,
                raw: reply.text,
            })
        }
    }
}

/// Recover a structured answer from truncated JSON.
///
/// Both fields must be *complete* quoted strings; a value cut off
/// mid-string is never guessed at. Missing reasoning is tolerated.
fn salvage_truncated(text: &str) -> Option<StructuredAnswer> {
    let answer = ANSWER_FIELD.captures(text)?.get(1)?.as_str().to_string();
    if answer.is_empty() {
        return None;
    }
    let reasoning = REASONING_FIELD
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "recovered from truncated output".to_string());
    Some(StructuredAnswer { answer, reasoning })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_start().trim_end_matches('`').trim()
}

fn build_system(category: TaskCategory) -> String {
    let base = "You are an expert quiz solver. Analyze the stage content and produce the \
                final, definitive answer, formatted exactly as the stage requests. You MUST \
                reply with JSON matching the requested schema. If previous attempt feedback \
                is present, correct the earlier mistake instead of repeating it.";
    let task_line = match category {
        TaskCategory::Extract => "The stage asks for a single fact: extract it exactly as displayed.",
        TaskCategory::Calculate => {
            "The stage requires a calculation: work through the arithmetic carefully before answering."
        }
        TaskCategory::Transcribe => {
            "The stage involves media content: rely on the transcript or description included in the content."
        }
        TaskCategory::ApplyLogic => {
            "The stage defines conditional rules: apply every branch exactly as written."
        }
    };
    format!("{base}\n{task_line}")
}

fn build_prompt(payload: &StagePayload, attempts: &[AttemptRecord]) -> String {
    let mut prompt = format!(
        "STAGE URL: {}\n\nPAGE CONTENT:\n{}",
        payload.url,
        condense(&payload.text)
    );

    if let Some(ref table) = payload.table {
        prompt.push_str("\n\nTABLE DATA:\n");
        prompt.push_str(&condense(table));
    }

    if let Some(ref media) = payload.media {
        prompt.push_str(&format!(
            "\n\nATTACHED MEDIA: {} ({}), {} bytes",
            media.kind,
            media.content_type,
            media.bytes.len()
        ));
    }

    if let Some(ref canvas) = payload.canvas {
        if let Some(ref expression) = canvas.expression {
            prompt.push_str("\n\nCANVAS TEXT:\n");
            prompt.push_str(expression);
        }
    }

    if !attempts.is_empty() {
        prompt.push_str("\n\n--- PREVIOUS ATTEMPT ERROR FEEDBACK ---\n");
        let feedback: Vec<String> = attempts.iter().map(AttemptRecord::feedback_line).collect();
        prompt.push_str(&feedback.join("\n"));
    }

    prompt
}

/// Collapse whitespace and cap length before prompting.
fn condense(text: &str) -> String {
    let collapsed = MULTI_SPACE.replace_all(text, " ");
    let collapsed = MULTI_NEWLINE.replace_all(&collapsed, "\n\n");
    truncate_at_char_boundary(collapsed.trim(), PROMPT_CONTENT_CAP)
}

fn truncate_at_char_boundary(text: &str, cap: usize) -> String {
    if text.len() <= cap {
        return text.to_string();
    }
    let mut end = cap;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Optimistic cost for limiter admission: prompt bytes over four plus the
/// full output budget.
fn estimate_tokens(system: &str, prompt: &str, max_output_tokens: u32) -> u64 {
    ((system.len() + prompt.len()) / 4) as u64 + u64::from(max_output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_classify::{StageClassifier, ModelPlanner};
    use gauntlet_limits::QuotaLimits;
    use gauntlet_test_utils::{MockBackend, ScriptedReply};

    fn plan_for(payload: &StagePayload) -> ModelPlan {
        let classification = StageClassifier::new().classify(payload);
        ModelPlanner::new("mock-model", "mock-fast").plan(
            &classification,
            payload,
            Duration::from_secs(120),
        )
    }

    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(QuotaLimits {
            rpm: 1_000,
            tpm: 100_000_000,
            rpd: 1_000_000,
        }))
    }

    fn payload() -> StagePayload {
        StagePayload::text_only("http://q.test/stage1", "What is the hidden code?")
    }

    #[tokio::test]
    async fn invoke_parses_structured_answer() {
        let backend = Arc::new(MockBackend::with_replies(vec![ScriptedReply::answer(
            "CODE-042",
        )]));
        let invoker = Invoker::new(backend.clone(), limiter());
        let payload = payload();
        let success = invoker
            .invoke(&payload, &plan_for(&payload), &[])
            .await
            .unwrap();
        assert_eq!(success.answer.answer, "CODE-042");
        assert_eq!(backend.call_count().await, 1);
    }

    #[tokio::test]
    async fn prompt_carries_prior_feedback_verbatim() {
        let backend = Arc::new(MockBackend::new());
        let invoker = Invoker::new(backend.clone(), limiter());
        let payload = payload();
        let attempts = vec![
            AttemptRecord {
                attempt: 1,
                variant: gauntlet_core::types::PromptVariant::Initial,
                raw_output: None,
                parsed: None,
                feedback: "Reason: wrong width. Submitted: CODE-42".into(),
            },
            AttemptRecord {
                attempt: 2,
                variant: gauntlet_core::types::PromptVariant::Feedback,
                raw_output: None,
                parsed: None,
                feedback: "Reason: response was not valid schema JSON".into(),
            },
        ];

        invoker
            .invoke(&payload, &plan_for(&payload), &attempts)
            .await
            .unwrap();

        let requests = backend.requests().await;
        let prompt = &requests[0].prompt;
        assert!(prompt.contains("PREVIOUS ATTEMPT ERROR FEEDBACK"));
        assert!(prompt.contains("Attempt 1 failed. Reason: wrong width. Submitted: CODE-42"));
        assert!(prompt.contains("Attempt 2 failed."));
        // Ordering: attempt 1 context precedes attempt 2.
        let first = prompt.find("Attempt 1 failed").unwrap();
        let second = prompt.find("Attempt 2 failed").unwrap();
        assert!(first < second);
    }

    #[tokio::test(start_paused = true)]
    async fn overload_backs_off_and_recovers() {
        let backend = Arc::new(MockBackend::with_replies(vec![
            ScriptedReply::Overloaded,
            ScriptedReply::answer("CODE-7"),
        ]));
        let invoker = Invoker::new(backend.clone(), limiter());
        let payload = payload();
        let success = invoker
            .invoke(&payload, &plan_for(&payload), &[])
            .await
            .unwrap();
        assert_eq!(success.answer.answer, "CODE-7");
        assert_eq!(backend.call_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_overload_exhausts_retry_ceiling() {
        let backend = Arc::new(MockBackend::with_replies(vec![
            ScriptedReply::Overloaded,
            ScriptedReply::Overloaded,
            ScriptedReply::Overloaded,
            ScriptedReply::Overloaded,
        ]));
        let invoker = Invoker::new(backend.clone(), limiter());
        let payload = payload();
        let err = invoker
            .invoke(&payload, &plan_for(&payload), &[])
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(backend.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn every_physical_request_passes_admission() {
        let backend = Arc::new(MockBackend::with_replies(vec![
            ScriptedReply::Overloaded,
            ScriptedReply::answer("CODE-9"),
        ]));
        let limiter = limiter();
        let invoker = Invoker::new(backend.clone(), limiter.clone());
        let payload = payload();
        invoker
            .invoke(&payload, &plan_for(&payload), &[])
            .await
            .unwrap();
        // Two physical requests -> two admitted events in the minute window.
        assert_eq!(limiter.usage().await.rpm.0, 2);
    }

    #[tokio::test]
    async fn garbage_reply_surfaces_schema_error_with_raw_text() {
        let backend = Arc::new(MockBackend::with_replies(vec![ScriptedReply::garbage()]));
        let invoker = Invoker::new(backend, limiter());
        let payload = payload();
        let err = invoker
            .invoke(&payload, &plan_for(&payload), &[])
            .await
            .unwrap_err();
        match err {
            GauntletError::SchemaParse { raw, .. } => {
                assert!(raw.contains("cannot answer"));
            }
            other => panic!("expected SchemaParse, got {other}"),
        }
    }

    #[test]
    fn interpret_accepts_fenced_json() {
        let reply = BackendReply {
            text: "```json\n{\"answer\": \"X-1\", \"reasoning\": \"r\"}\n```".into(),
            finish: Finish::Stop,
            total_tokens: 10,
        };
        let success = interpret_reply(reply).unwrap();
        assert_eq!(success.answer.answer, "X-1");
    }

    #[test]
    fn interpret_salvages_truncated_output() {
        let reply = BackendReply {
            text: "{\"answer\": \"CODE-123\", \"reasoning\": \"the table shows".into(),
            finish: Finish::MaxTokens,
            total_tokens: 512,
        };
        let success = interpret_reply(reply).unwrap();
        assert_eq!(success.answer.answer, "CODE-123");
        assert_eq!(success.answer.reasoning, "recovered from truncated output");
    }

    #[test]
    fn truncation_inside_answer_value_is_not_salvaged() {
        let reply = BackendReply {
            text: "{\"answer\": \"CODE-12".into(),
            finish: Finish::MaxTokens,
            total_tokens: 512,
        };
        assert!(interpret_reply(reply).is_err());
    }

    #[test]
    fn stop_finish_with_bad_json_is_not_salvaged() {
        // Salvage applies to the truncation condition only.
        let reply = BackendReply {
            text: "{\"answer\": \"CODE-12\", but prose follows".into(),
            finish: Finish::Stop,
            total_tokens: 40,
        };
        assert!(interpret_reply(reply).is_err());
    }

    #[test]
    fn condense_collapses_whitespace_and_caps() {
        let noisy = "a    b\t\tc\n\n\n\nd";
        assert_eq!(condense(noisy), "a b c\n\nd");

        let long = "x".repeat(PROMPT_CONTENT_CAP + 500);
        assert_eq!(condense(&long).len(), PROMPT_CONTENT_CAP);
    }

    #[test]
    fn estimate_includes_output_budget() {
        let estimate = estimate_tokens("sys", &"p".repeat(400), 2048);
        assert_eq!(estimate, (3 + 400) / 4 + 2048);
    }
}
