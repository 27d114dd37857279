// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Gauntlet engine.
//!
//! The engine talks to the outside world only through these traits: the LLM
//! backend, the stage fetch layer, and the answer submission board. All use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod backend;
pub mod board;
pub mod fetch;

pub use backend::{BackendRequest, BackendReply, Finish, QuizBackend};
pub use board::{AnswerBoard, Submission, Verdict};
pub use fetch::{StageDocument, StageFetcher};
