// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for the external structured-output reasoning backend.

use async_trait::async_trait;

use crate::error::GauntletError;

/// One structured-output request to the reasoning backend.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// Model identifier to invoke.
    pub model: String,
    /// System instructions.
    pub system: String,
    /// User prompt (stage content plus accumulated error feedback).
    pub prompt: String,
    /// Hard ceiling on generated output tokens.
    pub max_output_tokens: u32,
}

/// Why the backend stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    /// Natural completion.
    Stop,
    /// Output hit the token ceiling; the text is likely truncated JSON.
    MaxTokens,
    /// Any other provider-reported finish reason.
    Other(String),
}

/// Raw reply from the backend, before schema interpretation.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub text: String,
    pub finish: Finish,
    /// Total tokens the provider reported for the exchange.
    pub total_tokens: u64,
}

/// An LLM backend that accepts a prompt and a JSON output schema.
///
/// Implementations must map provider overload conditions (429/5xx) to
/// [`GauntletError::Overloaded`] so callers can drive backoff retries, and
/// unrecoverable conditions (bad credentials, rejected requests) to
/// [`GauntletError::Backend`].
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Human-readable backend name for logging.
    fn name(&self) -> &str;

    /// Sends one structured-output request.
    async fn generate(&self, request: BackendRequest) -> Result<BackendReply, GauntletError>;
}
