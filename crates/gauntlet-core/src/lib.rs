// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Gauntlet quiz runner.
//!
//! This crate provides the trait definitions, error types, and common types
//! used throughout the Gauntlet workspace. The engine crate depends only on
//! these traits; concrete backends, fetchers, and boards plug in behind them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GauntletError;
pub use traits::{
    AnswerBoard, BackendReply, BackendRequest, Finish, QuizBackend, StageDocument, StageFetcher,
    Submission, Verdict,
};
pub use types::{
    AttemptRecord, CanvasSnapshot, FormatHint, MediaBuffer, MediaKind, Modality, PromptVariant,
    RunReport, RunStatus, StageOutcome, StagePayload, StageResult, StructuredAnswer,
};
