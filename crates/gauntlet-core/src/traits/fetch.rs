// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for the external fetch/render layer.

use async_trait::async_trait;

use crate::error::GauntletError;
use crate::types::StagePayload;

/// Everything the fetch layer hands over for one stage page.
#[derive(Debug, Clone)]
pub struct StageDocument {
    pub payload: StagePayload,
    /// Auxiliary resources the stage asks to be fetched (relative or
    /// absolute URLs). The engine fetches these concurrently and joins the
    /// results into the payload before classification.
    pub aux_links: Vec<String>,
}

impl StageDocument {
    pub fn new(payload: StagePayload) -> Self {
        Self {
            payload,
            aux_links: Vec::new(),
        }
    }

    pub fn with_aux_links(mut self, links: Vec<String>) -> Self {
        self.aux_links = links;
        self
    }
}

/// The fetch/render collaborator: resolves a URL into structured stage
/// content. Rendering, script execution, and canvas capture happen behind
/// this trait.
#[async_trait]
pub trait StageFetcher: Send + Sync {
    /// Fetches and renders one stage page.
    async fn fetch_stage(&self, url: &str) -> Result<StageDocument, GauntletError>;

    /// Fetches one auxiliary resource as text (CSV reference, data file).
    async fn fetch_resource(&self, url: &str) -> Result<String, GauntletError>;
}
