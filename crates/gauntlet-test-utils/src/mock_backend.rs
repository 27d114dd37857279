// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reasoning backend for deterministic testing.
//!
//! `MockBackend` implements `QuizBackend` with pre-configured replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use gauntlet_core::{BackendReply, BackendRequest, Finish, GauntletError, QuizBackend};

/// One scripted backend reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A well-formed structured answer (finish `Stop`).
    Answer { answer: String, reasoning: String },
    /// Arbitrary raw text with an explicit finish reason.
    Raw { text: String, finish: Finish },
    /// A transient overload error.
    Overloaded,
    /// An unrecoverable backend error (bad credentials class).
    Fatal,
}

impl ScriptedReply {
    pub fn answer(answer: impl Into<String>) -> Self {
        ScriptedReply::Answer {
            answer: answer.into(),
            reasoning: "scripted reasoning".into(),
        }
    }

    /// Text that fails schema parsing outright.
    pub fn garbage() -> Self {
        ScriptedReply::Raw {
            text: "I cannot answer in the requested format.".into(),
            finish: Finish::Stop,
        }
    }

    /// A truncated JSON blob with a MAX_TOKENS finish.
    pub fn truncated(text: impl Into<String>) -> Self {
        ScriptedReply::Raw {
            text: text.into(),
            finish: Finish::MaxTokens,
        }
    }
}

/// A mock backend that pops scripted replies from a FIFO queue.
///
/// When the queue is empty, a default well-formed answer is returned. Every
/// request is recorded for prompt inspection in tests.
pub struct MockBackend {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<BackendRequest>>>,
}

impl MockBackend {
    /// Create a mock backend with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock backend pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of generate calls received.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn next_reply(&self) -> ScriptedReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::answer("mock-answer"))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuizBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: BackendRequest) -> Result<BackendReply, GauntletError> {
        self.requests.lock().await.push(request);

        match self.next_reply().await {
            ScriptedReply::Answer { answer, reasoning } => Ok(BackendReply {
                text: serde_json::json!({ "answer": answer, "reasoning": reasoning }).to_string(),
                finish: Finish::Stop,
                total_tokens: 42,
            }),
            ScriptedReply::Raw { text, finish } => Ok(BackendReply {
                text,
                finish,
                total_tokens: 42,
            }),
            ScriptedReply::Overloaded => Err(GauntletError::Overloaded {
                message: "mock overload (503)".into(),
            }),
            ScriptedReply::Fatal => Err(GauntletError::Backend {
                message: "mock credentials rejected".into(),
                source: None,
            }),
        }
    }
}
