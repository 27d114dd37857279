// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model planning with deadline-aware downgrades.
//!
//! Maps a classification to the backend model and token budget for one
//! attempt. The tier fixes the token budget; the model can be swapped for a
//! cheaper one when a text-only stage is running out of time.

use std::time::Duration;

use gauntlet_core::types::StagePayload;
use tracing::info;

use crate::classifier::{Classification, ComplexityTier, TaskCategory};

/// Remaining stage time below which text-only stages switch to the fast model.
const FAST_PATH_THRESHOLD: Duration = Duration::from_secs(60);

/// Planning decision for one backend attempt.
#[derive(Debug, Clone)]
pub struct ModelPlan {
    /// Model actually used for the attempt.
    pub model: String,
    /// Output-token ceiling, fixed by the tier.
    pub max_output_tokens: u32,
    /// Whether deadline pressure forced the fast model.
    pub fast_path: bool,
    pub tier: ComplexityTier,
    pub category: TaskCategory,
}

/// Picks the model and token budget for each attempt.
pub struct ModelPlanner {
    default_model: String,
    fast_model: String,
}

impl ModelPlanner {
    pub fn new(default_model: impl Into<String>, fast_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            fast_model: fast_model.into(),
        }
    }

    /// Plan one attempt.
    ///
    /// The downgrade applies only to text-only payloads: binary media needs
    /// the stronger model regardless of remaining time. The tier (and with
    /// it the token budget) is never changed by the downgrade.
    pub fn plan(
        &self,
        classification: &Classification,
        payload: &StagePayload,
        remaining: Duration,
    ) -> ModelPlan {
        let fast_path = payload.is_textual() && remaining < FAST_PATH_THRESHOLD;
        let model = if fast_path {
            info!(
                remaining_secs = remaining.as_secs(),
                model = self.fast_model.as_str(),
                "deadline pressure: switching to fast model"
            );
            self.fast_model.clone()
        } else {
            self.default_model.clone()
        };

        ModelPlan {
            model,
            max_output_tokens: classification.tier.max_output_tokens(),
            fast_path,
            tier: classification.tier,
            category: classification.category,
        }
    }
}
