// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage complexity classification and model planning for Gauntlet.
//!
//! The classifier inspects one stage payload and assigns a complexity tier
//! (which fixes the backend token budget) and a task category (which selects
//! the prompt template family). The planner maps that classification to a
//! concrete model, downgrading to a fast model for text-only stages under
//! deadline pressure.

pub mod classifier;
pub mod planner;

pub use classifier::{Classification, ComplexityTier, StageClassifier, TaskCategory};
pub use planner::{ModelPlan, ModelPlanner};
