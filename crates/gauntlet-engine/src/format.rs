// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer formatting against stage-declared format hints.
//!
//! Stages often imply a fixed-width answer format through worked examples
//! (`REGEX-008`) or placeholders (`MATRIX-???`, `DATE-XXX`). The model tends
//! to drop leading zeros; this module re-pads the numeric part so the
//! submitted answer matches the stage's declared contract. When a hint and
//! the raw answer disagree, the hint wins.

use std::sync::LazyLock;

use gauntlet_core::types::FormatHint;
use regex::Regex;

/// PREFIX-NUMBER answers are the only shape that gets reformatted.
static ANSWER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z-]*)-(\d+)$").unwrap());

/// Infer the canonical format hint for `prefix` from stage content.
///
/// An explicit same-prefix example with leading zeros is the most specific
/// hint and wins over any placeholder. Placeholder syntax is matched in
/// several variants: bare, parenthesized, `e.g.,`-prefixed, and
/// `format:`-prefixed, all case-insensitively.
pub fn detect_hint(prefix: &str, content: &str) -> Option<FormatHint> {
    let escaped = regex::escape(prefix);

    // Strategy 1: same-prefix examples showing leading zeros.
    if let Ok(example) = Regex::new(&format!(r"{escaped}-(\d+)")) {
        for caps in example.captures_iter(content) {
            let digits = &caps[1];
            if digits.len() > 1 && digits.starts_with('0') {
                return Some(FormatHint::Example {
                    width: digits.len(),
                });
            }
        }
    }

    // Strategy 2: placeholder runs of `?`/`X` after the prefix.
    let placeholder_patterns = [
        format!(r"(?i){escaped}-([?X]+)"),
        format!(r"(?i)\({escaped}-([?X]+)\)"),
        format!(r"(?i)e\.g\.,?\s*{escaped}-([?X]+)"),
        format!(r"(?i)format[:\s]+{escaped}-([?X]+)"),
    ];
    for pattern in placeholder_patterns {
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(content) {
            return Some(FormatHint::Placeholder {
                width: caps[1].len(),
            });
        }
    }

    None
}

/// Coerce `answer` to the format the stage content implies.
///
/// Answers that do not match the PREFIX-NUMBER shape, and stages without a
/// detectable hint, pass through unchanged. Placeholder hints only pad
/// (never truncate); example hints replicate the example's width the same
/// way.
pub fn format_answer(answer: &str, content: &str) -> String {
    let Some(caps) = ANSWER_SHAPE.captures(answer) else {
        return answer.to_string();
    };
    let prefix = &caps[1];
    let number = &caps[2];

    let padded = match detect_hint(prefix, content) {
        Some(FormatHint::Example { width }) => pad(prefix, number, width),
        Some(FormatHint::Placeholder { width }) if width >= number.len() => {
            pad(prefix, number, width)
        }
        _ => return answer.to_string(),
    };

    if padded != answer {
        tracing::info!(
            raw = answer,
            formatted = padded.as_str(),
            "format correction applied"
        );
    }
    padded
}

fn pad(prefix: &str, number: &str, width: usize) -> String {
    format!("{prefix}-{number:0>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_pads_to_width() {
        let content = "Submit your result as MATRIX-??? to the endpoint below.";
        assert_eq!(format_answer("MATRIX-94", content), "MATRIX-094");
    }

    #[test]
    fn example_with_leading_zero_pads_to_width() {
        let content = "Answers look like REGEX-008 or similar codes.";
        assert_eq!(format_answer("REGEX-42", content), "REGEX-042");
    }

    #[test]
    fn no_hint_passes_through() {
        let content = "Just tell us the code.";
        assert_eq!(format_answer("MATRIX-94", content), "MATRIX-94");
    }

    #[test]
    fn non_prefix_number_answers_pass_through() {
        let content = "Format: CODE-???";
        assert_eq!(format_answer("forty-two", content), "forty-two");
        assert_eq!(format_answer("12345", content), "12345");
    }

    #[test]
    fn example_wins_over_placeholder() {
        // Both hints present with different widths: the worked example is
        // more specific and establishes width 3, not the placeholder's 5.
        let content = "Previous answer: PARSE-007. Submit as PARSE-?????.";
        assert_eq!(format_answer("PARSE-19", content), "PARSE-019");
    }

    #[test]
    fn placeholder_shorter_than_answer_does_not_truncate() {
        let content = "Submit as DATE-??";
        assert_eq!(format_answer("DATE-2024", content), "DATE-2024");
    }

    #[test]
    fn example_without_leading_zero_is_not_a_hint() {
        let content = "Earlier stages produced SCRAPE-80235.";
        assert_eq!(format_answer("SCRAPE-99", content), "SCRAPE-99");
    }

    #[test]
    fn lowercase_placeholder_variant_matches() {
        let content = "submit as matrix-xxx please";
        assert_eq!(format_answer("MATRIX-7", content), "MATRIX-007");
    }

    #[test]
    fn eg_prefixed_placeholder_matches() {
        let content = "The code format (e.g., PARSE-????) must be exact.";
        assert_eq!(format_answer("PARSE-137", content), "PARSE-0137");
    }

    #[test]
    fn hyphenated_prefix_is_preserved() {
        let content = "Answer format: TOP-SECRET-????";
        assert_eq!(format_answer("TOP-SECRET-12", content), "TOP-SECRET-0012");
    }

    #[test]
    fn detect_hint_reports_kind() {
        assert_eq!(
            detect_hint("MATRIX", "see MATRIX-???"),
            Some(FormatHint::Placeholder { width: 3 })
        );
        assert_eq!(
            detect_hint("MATRIX", "like MATRIX-094"),
            Some(FormatHint::Example { width: 3 })
        );
        assert_eq!(detect_hint("MATRIX", "no hints here"), None);
    }
}
