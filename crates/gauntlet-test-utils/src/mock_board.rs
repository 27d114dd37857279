// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock answer board with scripted verdicts.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use gauntlet_core::{AnswerBoard, GauntletError, Submission, Verdict};

/// An accepting verdict advancing to `next_url` (None ends the quiz).
pub fn accepted(next_url: Option<&str>) -> Verdict {
    Verdict {
        correct: true,
        next_url: next_url.map(str::to_string),
        reason: None,
    }
}

/// A rejecting verdict with a reason string.
pub fn rejected(reason: &str) -> Verdict {
    Verdict {
        correct: false,
        next_url: None,
        reason: Some(reason.to_string()),
    }
}

/// A mock board that pops scripted verdicts from a FIFO queue.
///
/// When the queue is empty, submissions are accepted with no next URL.
/// Every submission is recorded for inspection, along with the endpoint it
/// was posted to.
pub struct MockBoard {
    verdicts: Arc<Mutex<VecDeque<Verdict>>>,
    submissions: Arc<Mutex<Vec<(String, Submission)>>>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            verdicts: Arc::new(Mutex::new(VecDeque::new())),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_verdicts(verdicts: Vec<Verdict>) -> Self {
        Self {
            verdicts: Arc::new(Mutex::new(VecDeque::from(verdicts))),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_verdict(&self, verdict: Verdict) {
        self.verdicts.lock().await.push_back(verdict);
    }

    /// All `(endpoint, submission)` pairs received so far, in order.
    pub async fn submissions(&self) -> Vec<(String, Submission)> {
        self.submissions.lock().await.clone()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerBoard for MockBoard {
    async fn submit(
        &self,
        endpoint: &str,
        submission: &Submission,
    ) -> Result<Verdict, GauntletError> {
        self.submissions
            .lock()
            .await
            .push((endpoint.to_string(), submission.clone()));
        Ok(self
            .verdicts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| accepted(None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(answer: &str) -> Submission {
        Submission {
            identity: "solver@example.com".into(),
            secret: "s3cret".into(),
            url: "http://q.test/stage1".into(),
            answer: answer.into(),
            reasoning: "because".into(),
        }
    }

    #[tokio::test]
    async fn verdicts_pop_in_order() {
        let board = MockBoard::with_verdicts(vec![
            rejected("too small"),
            accepted(Some("http://q.test/stage2")),
        ]);

        let endpoint = "http://q.test/submit";
        let verdict = board.submit(endpoint, &submission("41")).await.unwrap();
        assert!(!verdict.correct);
        let verdict = board.submit(endpoint, &submission("42")).await.unwrap();
        assert_eq!(verdict.next_url.as_deref(), Some("http://q.test/stage2"));

        // Queue exhausted: default accept with no next stage.
        let verdict = board.submit(endpoint, &submission("43")).await.unwrap();
        assert!(verdict.correct);
        assert!(verdict.next_url.is_none());
    }

    #[tokio::test]
    async fn submissions_are_recorded_with_endpoint() {
        let board = MockBoard::new();
        board
            .submit("http://q.test/submit", &submission("first"))
            .await
            .unwrap();
        board
            .submit("http://q.test/submit", &submission("second"))
            .await
            .unwrap();
        let recorded = board.submissions().await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, "http://q.test/submit");
        assert_eq!(recorded[1].1.answer, "second");
    }
}
