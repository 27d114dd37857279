// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission endpoint discovery.
//!
//! Stage pages describe where to post answers in free text ("POST this JSON
//! to ...", "submit to ..."), in link lists, or in JSON-ish snippets. The
//! patterns are tried in specificity order; when none hits, the answer goes
//! to `<origin>/submit`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

static POST_JSON_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)POST this JSON to\s+(https?://[^\s<>"')]+)"#).unwrap()
});

static POST_ANSWER_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Post your answer to\s+(https?://[^\s<>"')]+)"#).unwrap()
});

static SUBMIT_OR_SEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:submit|send)\s+(?:to|at)?\s*(https?://[^\s<>"')]+)"#).unwrap()
});

static URL_CONTAINING_SUBMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(https?://[^\s<>"')]*submit[^\s<>"')]*)"#).unwrap()
});

static JSON_ENDPOINT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["'](?:submit_url|endpoint|url)["']\s*:\s*["']([^"']+)["']"#).unwrap()
});

static ORIGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(https?://[^/]+)").unwrap());

static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;!?)]+$").unwrap());

/// Find the submission endpoint for a stage.
///
/// Scans the stage text with the phrase patterns first, then the discovered
/// link list, then JSON-ish key/value snippets. Falls back to the page
/// origin joined with `/submit`.
pub fn discover_submit_url(text: &str, links: &[String], page_url: &str) -> String {
    let found = POST_JSON_TO
        .captures(text)
        .or_else(|| POST_ANSWER_TO.captures(text))
        .or_else(|| SUBMIT_OR_SEND.captures(text))
        .or_else(|| URL_CONTAINING_SUBMIT.captures(text))
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            links
                .iter()
                .find(|link| {
                    let lower = link.to_lowercase();
                    lower.contains("submit") || lower.contains("answer")
                })
                .cloned()
        })
        .or_else(|| {
            JSON_ENDPOINT_KEY
                .captures(text)
                .map(|caps| caps[1].to_string())
        });

    match found {
        Some(url) => {
            let cleaned = TRAILING_PUNCTUATION.replace(&url, "").to_string();
            let resolved = resolve(&cleaned, page_url);
            info!(submit_url = resolved.as_str(), "extracted submission URL");
            resolved
        }
        None => {
            let fallback = match ORIGIN.captures(page_url) {
                Some(caps) => format!("{}/submit", &caps[1]),
                None => format!("{}/submit", page_url.trim_end_matches('/')),
            };
            warn!(
                fallback = fallback.as_str(),
                "could not extract submission URL from page content"
            );
            fallback
        }
    }
}

/// Resolve a site-relative endpoint against the page origin.
fn resolve(url: &str, page_url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match ORIGIN.captures(page_url) {
        Some(caps) => format!("{}/{}", &caps[1], url.trim_start_matches('/')),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "http://quiz.example.com/stage3";

    #[test]
    fn post_this_json_pattern_wins() {
        let text = "Do the task. POST this JSON to http://quiz.example.com/api/check then wait.";
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "http://quiz.example.com/api/check"
        );
    }

    #[test]
    fn post_your_answer_pattern() {
        let text = "Post your answer to https://quiz.example.com/grade";
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "https://quiz.example.com/grade"
        );
    }

    #[test]
    fn submit_to_pattern() {
        let text = "When done, submit to http://quiz.example.com/s3/check.";
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "http://quiz.example.com/s3/check"
        );
    }

    #[test]
    fn any_url_containing_submit() {
        let text = "See http://quiz.example.com/stage3/submit-here for details";
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "http://quiz.example.com/stage3/submit-here"
        );
    }

    #[test]
    fn link_list_is_scanned() {
        let links = vec![
            "http://quiz.example.com/css/site.css".to_string(),
            "http://quiz.example.com/answers/post".to_string(),
        ];
        assert_eq!(
            discover_submit_url("nothing in the text", &links, PAGE_URL),
            "http://quiz.example.com/answers/post"
        );
    }

    #[test]
    fn json_key_snippet_resolves_relative_endpoint() {
        let text = r#"config = {"submit_url": "/api/v2/submit", "retries": 3}"#;
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "http://quiz.example.com/api/v2/submit"
        );
    }

    #[test]
    fn trailing_punctuation_is_stripped() {
        let text = "POST this JSON to http://quiz.example.com/check.";
        assert_eq!(
            discover_submit_url(text, &[], PAGE_URL),
            "http://quiz.example.com/check"
        );
    }

    #[test]
    fn falls_back_to_origin_submit() {
        assert_eq!(
            discover_submit_url("no endpoint mentioned anywhere", &[], PAGE_URL),
            "http://quiz.example.com/submit"
        );
    }

    #[test]
    fn phrase_patterns_beat_link_list() {
        let links = vec!["http://quiz.example.com/answers/post".to_string()];
        let text = "POST this JSON to http://quiz.example.com/the-real-endpoint";
        assert_eq!(
            discover_submit_url(text, &links, PAGE_URL),
            "http://quiz.example.com/the-real-endpoint"
        );
    }
}
