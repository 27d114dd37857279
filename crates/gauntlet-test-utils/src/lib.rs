// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for deterministic Gauntlet engine tests.
//!
//! Provides FIFO-scripted implementations of the three collaborator traits
//! so engine behavior can be tested without a network, a browser, or an LLM.

pub mod mock_backend;
pub mod mock_board;
pub mod mock_fetcher;

pub use mock_backend::{MockBackend, ScriptedReply};
pub use mock_board::{accepted, rejected, MockBoard};
pub use mock_fetcher::MockFetcher;
