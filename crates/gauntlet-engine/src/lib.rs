// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage orchestration engine for the Gauntlet quiz runner.
//!
//! The engine sequences one stage after another: classify the payload, try
//! a free closed-form solution, invoke the reasoning backend under rate
//! limits and a hard per-stage deadline, coerce the answer to the stage's
//! declared format, submit it, and follow the returned URL to the next
//! stage. Recoverable failures stay inside the stage loop as feedback for
//! the next attempt; only deadline exhaustion and fatal errors end a run.

pub mod alphametic;
pub mod format;
pub mod http;
pub mod invoker;
pub mod orchestrator;
pub mod submit;

pub use http::{HttpBoard, HttpFetcher};
pub use invoker::{InvokeSuccess, Invoker};
pub use orchestrator::{OrchestratorConfig, RunRequest, StageOrchestrator};
