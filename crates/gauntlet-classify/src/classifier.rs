// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic stage complexity classification.
//!
//! Classifies a stage payload into Simple/Medium/Complex/VeryComplex tiers
//! using zero-cost heuristic rules. No LLM pre-call, no network, no latency.
//! The tier fixes the output-token budget for the backend call; the task
//! category selects the prompt template family.

use gauntlet_core::types::{Modality, StagePayload};
use strum::Display;

/// Stage complexity tiers, ordered by estimated solving effort.
///
/// Escalation is monotonic: a stronger signal can only raise the tier,
/// never lower it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ComplexityTier {
    /// Single-fact extraction from a small page.
    Simple,
    /// A calculation or multi-field extraction over small content.
    Medium,
    /// Large validation tables or conditional/branching arithmetic.
    Complex,
    /// Audio combined with tabular data, or a canvas puzzle that needs
    /// computation beyond reading the image.
    VeryComplex,
}

impl ComplexityTier {
    /// Fixed output-token budget bound to each tier.
    pub fn max_output_tokens(self) -> u32 {
        match self {
            ComplexityTier::Simple => 512,
            ComplexityTier::Medium => 1536,
            ComplexityTier::Complex => 2048,
            ComplexityTier::VeryComplex => 4096,
        }
    }
}

/// Which prompt template family a stage should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TaskCategory {
    Extract,
    Calculate,
    Transcribe,
    ApplyLogic,
}

/// Result of classifying one stage payload.
#[derive(Debug, Clone)]
pub struct Classification {
    pub tier: ComplexityTier,
    pub category: TaskCategory,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

/// Cues that indicate a calculation rather than plain extraction.
const CALCULATION_CUES: &[&str] = &[
    "calculate", "compute", "sum", "total", "average", "mean", "median", "count", "how many",
    "difference", "multiply", "percentage", "convert",
];

/// Cues that indicate conditional or branching arithmetic.
const BRANCHING_CUES: &[&str] = &[
    "bonus",
    "tiered",
    "bracket",
    "if the",
    "otherwise",
    "penalty",
    "surcharge",
    "depending on",
    "apply the rule",
    "for each employee",
    "eligibility",
];

/// Heuristic stage classifier with zero cost and zero latency.
pub struct StageClassifier {
    /// Tabular text above this many characters escalates to Complex.
    table_threshold: usize,
}

impl StageClassifier {
    /// Create a classifier with the default table-size threshold.
    pub fn new() -> Self {
        Self {
            table_threshold: 800,
        }
    }

    /// Create a classifier with a custom table-size threshold.
    pub fn with_table_threshold(table_threshold: usize) -> Self {
        Self { table_threshold }
    }

    /// Classify a stage payload.
    ///
    /// Deterministic, pure function of payload shape and size. When several
    /// signals qualify, the highest tier wins.
    pub fn classify(&self, payload: &StagePayload) -> Classification {
        let modality = payload.dominant_modality();
        let lower = payload.textual_content().to_lowercase();

        let mut tier = ComplexityTier::Simple;
        let mut reason = "single-fact extraction";

        fn escalate(
            current: &mut ComplexityTier,
            reason_slot: &mut &'static str,
            candidate: ComplexityTier,
            why: &'static str,
        ) {
            if candidate > *current {
                *current = candidate;
                *reason_slot = why;
            }
        }

        if CALCULATION_CUES.iter().any(|cue| lower.contains(cue)) {
            escalate(
                &mut tier,
                &mut reason,
                ComplexityTier::Medium,
                "calculation cues in stage text",
            );
        }

        if payload.table.is_some() {
            escalate(
                &mut tier,
                &mut reason,
                ComplexityTier::Medium,
                "multi-field tabular extraction",
            );
        }

        if BRANCHING_CUES.iter().any(|cue| lower.contains(cue)) {
            escalate(
                &mut tier,
                &mut reason,
                ComplexityTier::Complex,
                "conditional or branching arithmetic cues",
            );
        }

        if payload
            .table
            .as_ref()
            .is_some_and(|t| t.len() > self.table_threshold)
        {
            escalate(
                &mut tier,
                &mut reason,
                ComplexityTier::Complex,
                "validation table above size threshold",
            );
        }

        match modality {
            Modality::Audio | Modality::Image => {
                escalate(
                    &mut tier,
                    &mut reason,
                    ComplexityTier::Complex,
                    "binary media requires transcription or reading",
                );
            }
            Modality::AudioTable => {
                escalate(
                    &mut tier,
                    &mut reason,
                    ComplexityTier::VeryComplex,
                    "audio combined with tabular data",
                );
            }
            Modality::Canvas => {
                let computational = payload
                    .canvas
                    .as_ref()
                    .is_some_and(|c| c.expression.is_some());
                if computational {
                    escalate(
                        &mut tier,
                        &mut reason,
                        ComplexityTier::VeryComplex,
                        "canvas puzzle requiring computation",
                    );
                } else {
                    escalate(
                        &mut tier,
                        &mut reason,
                        ComplexityTier::Complex,
                        "canvas snapshot image read",
                    );
                }
            }
            Modality::Text | Modality::Table => {}
        }

        let category = self.category_for(payload, modality, &lower);

        Classification {
            tier,
            category,
            reason,
        }
    }

    fn category_for(&self, payload: &StagePayload, modality: Modality, lower: &str) -> TaskCategory {
        match modality {
            Modality::Audio | Modality::AudioTable => TaskCategory::Transcribe,
            _ => {
                if BRANCHING_CUES.iter().any(|cue| lower.contains(cue)) {
                    TaskCategory::ApplyLogic
                } else if payload.table.is_some()
                    || CALCULATION_CUES.iter().any(|cue| lower.contains(cue))
                {
                    TaskCategory::Calculate
                } else {
                    TaskCategory::Extract
                }
            }
        }
    }
}

impl Default for StageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_core::types::{CanvasSnapshot, MediaBuffer, MediaKind};

    fn audio() -> MediaBuffer {
        MediaBuffer {
            kind: MediaKind::Audio,
            content_type: "audio/ogg".into(),
            bytes: vec![0; 8],
        }
    }

    #[test]
    fn plain_question_is_simple_extract() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only("http://q.test/s1", "What is the hidden code?");
        let result = c.classify(&payload);
        assert_eq!(result.tier, ComplexityTier::Simple);
        assert_eq!(result.category, TaskCategory::Extract);
    }

    #[test]
    fn calculation_cues_are_medium() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only(
            "http://q.test/s2",
            "Calculate the total of the listed prices.",
        );
        let result = c.classify(&payload);
        assert_eq!(result.tier, ComplexityTier::Medium);
        assert_eq!(result.category, TaskCategory::Calculate);
    }

    #[test]
    fn small_table_is_medium() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only("http://q.test/s3", "Find the entry")
            .with_table("id,name\n1,alpha\n2,beta");
        assert_eq!(c.classify(&payload).tier, ComplexityTier::Medium);
    }

    #[test]
    fn large_table_is_complex() {
        let c = StageClassifier::new();
        let big_table = "id,name,amount\n".repeat(80);
        assert!(big_table.len() > 800);
        let payload =
            StagePayload::text_only("http://q.test/s4", "Validate the rows").with_table(big_table);
        assert_eq!(c.classify(&payload).tier, ComplexityTier::Complex);
    }

    #[test]
    fn branching_language_is_apply_logic() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only(
            "http://q.test/s5",
            "Each employee gets a bonus depending on their band; otherwise apply the rule for contractors.",
        );
        let result = c.classify(&payload);
        assert_eq!(result.tier, ComplexityTier::Complex);
        assert_eq!(result.category, TaskCategory::ApplyLogic);
    }

    #[test]
    fn audio_with_table_is_very_complex_transcribe() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only("http://q.test/s6", "Transcribe then filter")
            .with_table("id,amount\n1,100")
            .with_media(audio());
        let result = c.classify(&payload);
        assert_eq!(result.tier, ComplexityTier::VeryComplex);
        assert_eq!(result.category, TaskCategory::Transcribe);
    }

    #[test]
    fn canvas_expression_is_very_complex() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only("http://q.test/s7", "Solve the drawn puzzle")
            .with_canvas(CanvasSnapshot {
                expression: Some("SEND + MORE = MONEY".into()),
                ..Default::default()
            });
        assert_eq!(c.classify(&payload).tier, ComplexityTier::VeryComplex);
    }

    #[test]
    fn escalation_is_monotonic() {
        // Adding audio+table to an already-Complex payload never downgrades.
        let c = StageClassifier::new();
        let base = StagePayload::text_only(
            "http://q.test/s8",
            "Apply the bonus rule depending on the band.",
        );
        let base_tier = c.classify(&base).tier;
        assert_eq!(base_tier, ComplexityTier::Complex);

        let enriched = base.with_table("id,band\n1,A").with_media(audio());
        let enriched_tier = c.classify(&enriched).tier;
        assert!(enriched_tier >= base_tier);
        assert_eq!(enriched_tier, ComplexityTier::VeryComplex);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = StageClassifier::new();
        let payload = StagePayload::text_only("http://q.test/s9", "Count the rows and sum them")
            .with_table("a,b\n1,2");
        let first = c.classify(&payload);
        for _ in 0..10 {
            let again = c.classify(&payload);
            assert_eq!(again.tier, first.tier);
            assert_eq!(again.category, first.category);
        }
    }

    #[test]
    fn tier_budgets_are_fixed() {
        assert_eq!(ComplexityTier::Simple.max_output_tokens(), 512);
        assert_eq!(ComplexityTier::Medium.max_output_tokens(), 1536);
        assert_eq!(ComplexityTier::Complex.max_output_tokens(), 2048);
        assert_eq!(ComplexityTier::VeryComplex.max_output_tokens(), 4096);
    }

    #[test]
    fn tier_ordering_matches_escalation() {
        assert!(ComplexityTier::Simple < ComplexityTier::Medium);
        assert!(ComplexityTier::Medium < ComplexityTier::Complex);
        assert!(ComplexityTier::Complex < ComplexityTier::VeryComplex);
    }
}
