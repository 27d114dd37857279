// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Gauntlet workspace.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Kind of binary media attached to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
}

/// An opaque binary buffer handed over by the fetch layer.
#[derive(Debug, Clone)]
pub struct MediaBuffer {
    pub kind: MediaKind,
    /// MIME type reported by the fetch layer (e.g. `audio/ogg; codecs=opus`).
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Snapshot of a canvas-rendered puzzle captured by the fetch layer.
///
/// The fetch layer extracts the drawn source text when it can; the optional
/// digest is a lowercase hex SHA-256 prefix the stage publishes for
/// content-addressed answer verification.
#[derive(Debug, Clone, Default)]
pub struct CanvasSnapshot {
    pub expression: Option<String>,
    pub expected_digest: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// The dominant modality of a stage payload, used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Modality {
    Text,
    Table,
    Audio,
    Image,
    Canvas,
    /// Audio combined with tabular data — the highest-effort combination.
    AudioTable,
}

/// Content extracted from one stage page.
///
/// Several parts may be present at once; [`StagePayload::dominant_modality`]
/// selects the single modality that drives classification.
#[derive(Debug, Clone)]
pub struct StagePayload {
    /// URL the payload was fetched from.
    pub url: String,
    /// Main text blob of the page.
    pub text: String,
    /// Delimited tabular text (CSV or similar), when present.
    pub table: Option<String>,
    /// Audio or image buffer, when present.
    pub media: Option<MediaBuffer>,
    /// Canvas snapshot, when present.
    pub canvas: Option<CanvasSnapshot>,
}

impl StagePayload {
    /// A payload consisting only of page text.
    pub fn text_only(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            table: None,
            media: None,
            canvas: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_media(mut self, media: MediaBuffer) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_canvas(mut self, canvas: CanvasSnapshot) -> Self {
        self.canvas = Some(canvas);
        self
    }

    /// Selects the single modality that drives classification.
    ///
    /// Priority order reflects solving effort: audio+table beats canvas,
    /// canvas beats lone media, lone media beats tables, text is the floor.
    pub fn dominant_modality(&self) -> Modality {
        let audio = matches!(
            self.media,
            Some(MediaBuffer {
                kind: MediaKind::Audio,
                ..
            })
        );
        if audio && self.table.is_some() {
            return Modality::AudioTable;
        }
        if self.canvas.is_some() {
            return Modality::Canvas;
        }
        match self.media {
            Some(MediaBuffer {
                kind: MediaKind::Audio,
                ..
            }) => Modality::Audio,
            Some(MediaBuffer {
                kind: MediaKind::Image,
                ..
            }) => Modality::Image,
            None => {
                if self.table.is_some() {
                    Modality::Table
                } else {
                    Modality::Text
                }
            }
        }
    }

    /// True when the payload carries no binary content.
    pub fn is_textual(&self) -> bool {
        self.media.is_none() && self.canvas.is_none()
    }

    /// All textual content of the stage, joined for hint scanning and
    /// prompt assembly.
    pub fn textual_content(&self) -> String {
        let mut content = self.text.clone();
        if let Some(ref table) = self.table {
            content.push_str("\n\n");
            content.push_str(table);
        }
        if let Some(CanvasSnapshot {
            expression: Some(ref expr),
            ..
        }) = self.canvas
        {
            content.push_str("\n\n");
            content.push_str(expr);
        }
        content
    }
}

/// The structured output schema every backend reply must conform to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// The final answer, formatted as the stage requests.
    pub answer: String,
    /// Concise reasoning trace, kept for submission and audit logging.
    pub reasoning: String,
}

/// Which prompt family an attempt used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PromptVariant {
    /// First attempt: no prior-error context.
    Initial,
    /// Later attempts: prompt enriched with accumulated failure feedback.
    Feedback,
}

/// Record of one backend attempt within a stage.
///
/// Attempts accumulate in order; each later attempt's prompt carries every
/// earlier record's feedback line verbatim.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number within the stage.
    pub attempt: u32,
    pub variant: PromptVariant,
    /// Raw backend output, when any was received.
    pub raw_output: Option<String>,
    /// Parsed structured answer, when schema parsing succeeded.
    pub parsed: Option<StructuredAnswer>,
    /// Failure description carried into the next attempt's prompt.
    pub feedback: String,
}

impl AttemptRecord {
    /// The line fed into the next attempt's prompt.
    pub fn feedback_line(&self) -> String {
        format!("Attempt {} failed. {}", self.attempt, self.feedback)
    }
}

/// Terminal outcome of one stage.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Solved {
        answer: String,
        elapsed: Duration,
        attempts: u32,
    },
    Failed {
        reason: String,
        attempts: u32,
    },
}

/// One entry in the run ledger. Emitted once per stage, never mutated.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub url: String,
    pub outcome: StageOutcome,
}

impl StageResult {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, StageOutcome::Solved { .. })
    }
}

/// Terminal status of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Final report returned to the caller when a run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    pub stages_completed: usize,
    pub total_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_failed: Option<String>,
}

impl RunReport {
    pub fn success(final_answer: String, stages_completed: usize, total_time: Duration) -> Self {
        Self {
            status: RunStatus::Completed,
            final_answer: Some(final_answer),
            stages_completed,
            total_time_secs: total_time.as_secs_f64(),
            error: None,
            stage_failed: None,
        }
    }

    pub fn failure(
        error: String,
        stage_failed: String,
        stages_completed: usize,
        total_time: Duration,
    ) -> Self {
        Self {
            status: RunStatus::Failed,
            final_answer: None,
            stages_completed,
            total_time_secs: total_time.as_secs_f64(),
            error: Some(error),
            stage_failed: Some(stage_failed),
        }
    }
}

/// A format hint inferred from stage content.
///
/// At most one canonical hint applies per stage; an explicit worked example
/// is more specific than a generic placeholder and wins when both appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    /// A same-prefix example with leading zeros establishes the digit width.
    Example { width: usize },
    /// A run of `?`/`X` characters after the prefix establishes the width.
    Placeholder { width: usize },
}

impl FormatHint {
    pub fn width(&self) -> usize {
        match *self {
            FormatHint::Example { width } | FormatHint::Placeholder { width } => width,
        }
    }
}
