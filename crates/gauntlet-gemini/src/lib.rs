// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini structured-output backend for the Gauntlet quiz runner.
//!
//! Wraps the `generateContent` REST API behind the [`QuizBackend`] trait:
//! every request asks for JSON mode with the fixed `{answer, reasoning}`
//! schema and the caller-supplied output-token ceiling.

pub mod client;
pub mod types;

use async_trait::async_trait;
use gauntlet_core::{BackendReply, BackendRequest, Finish, GauntletError, QuizBackend};

use crate::client::GeminiClient;
use crate::types::{
    answer_schema, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

/// [`QuizBackend`] implementation backed by the Gemini API.
#[derive(Debug)]
pub struct GeminiBackend {
    client: GeminiClient,
}

impl GeminiBackend {
    /// Creates a backend from an API key.
    ///
    /// A missing key is a fatal configuration problem surfaced before any
    /// stage runs.
    pub fn new(api_key: &str) -> Result<Self, GauntletError> {
        if api_key.trim().is_empty() {
            return Err(GauntletError::Backend {
                message: "Gemini API key is missing; set backend.api_key or GEMINI_API_KEY".into(),
                source: None,
            });
        }
        Ok(Self {
            client: GeminiClient::new(api_key)?,
        })
    }
}

#[async_trait]
impl QuizBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: BackendRequest) -> Result<BackendReply, GauntletError> {
        let wire_request = GenerateContentRequest {
            system_instruction: Content::system(request.system),
            contents: vec![Content::user(request.prompt)],
            generation_config: GenerationConfig::json(answer_schema(), request.max_output_tokens),
        };

        let response = self.client.generate(&request.model, &wire_request).await?;
        reply_from(response)
    }
}

/// Flattens a wire response into the backend-neutral reply shape.
fn reply_from(response: GenerateContentResponse) -> Result<BackendReply, GauntletError> {
    let total_tokens = response
        .usage_metadata
        .as_ref()
        .map(|u| u.total_token_count)
        .unwrap_or_default();

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GauntletError::Backend {
            message: "API response contained no candidates".into(),
            source: None,
        })?;

    let finish = match candidate.finish_reason.as_deref() {
        Some("STOP") => Finish::Stop,
        Some("MAX_TOKENS") => Finish::MaxTokens,
        Some(other) => Finish::Other(other.to_string()),
        None => Finish::Other("unreported".to_string()),
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(BackendReply {
        text,
        finish,
        total_tokens,
    })
}
