// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Gauntlet quiz runner.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Gauntlet collaborator traits and
/// core operations.
#[derive(Debug, Error)]
pub enum GauntletError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Stage fetch errors (page unreachable, resource download failure).
    #[error("fetch error: {message}")]
    Fetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-recoverable backend errors (missing credentials, rejected request).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transient backend overload (429/5xx class). Recovered by backoff retry.
    #[error("backend overloaded: {message}")]
    Overloaded { message: String },

    /// Model output did not conform to the requested schema, even after
    /// partial-extraction salvage. Carries the raw text for feedback loops.
    #[error("schema parse failure: {message}")]
    SchemaParse { message: String, raw: String },

    /// A rate-limit quota dimension cannot admit the request.
    #[error("quota exhausted: {message}")]
    QuotaExhausted { message: String },

    /// The answer board rejected a submitted answer.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    /// The per-stage time budget ran out.
    #[error("stage deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GauntletError {
    /// True for errors that a backoff retry inside the same stage may recover.
    pub fn is_transient(&self) -> bool {
        matches!(self, GauntletError::Overloaded { .. })
    }

    /// True for errors that abort the whole run rather than one stage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GauntletError::Backend { .. }
                | GauntletError::Config(_)
                | GauntletError::QuotaExhausted { .. }
        )
    }
}
