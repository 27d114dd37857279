// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for the answer submission collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GauntletError;

/// Body posted to a stage's submission endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Identity the run was started for (email or similar).
    pub identity: String,
    pub secret: String,
    /// The stage URL this answer is for.
    pub url: String,
    pub answer: String,
    pub reasoning: String,
}

/// The board's reply to a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    pub correct: bool,
    /// Next stage URL; absent on the final stage.
    #[serde(rename = "url")]
    pub next_url: Option<String>,
    /// Rejection reason when `correct` is false.
    #[serde(default)]
    pub reason: Option<String>,
}

/// The submission collaborator: posts an answer to a stage's discovered
/// submission endpoint and reports whether it was accepted, with the next
/// stage URL on success.
#[async_trait]
pub trait AnswerBoard: Send + Sync {
    async fn submit(
        &self,
        endpoint: &str,
        submission: &Submission,
    ) -> Result<Verdict, GauntletError>;
}
