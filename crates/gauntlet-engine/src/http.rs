// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-HTTP implementations of the fetch and submission collaborators.
//!
//! `HttpFetcher` is the no-browser floor: it downloads page text without
//! script execution or canvas capture (a rendering collaborator can replace
//! it behind the same trait). `HttpBoard` posts answers and parses verdicts
//! defensively -- quiz servers have been observed returning plain text where
//! JSON was promised.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use gauntlet_core::types::StagePayload;
use gauntlet_core::{AnswerBoard, GauntletError, StageDocument, StageFetcher, Submission, Verdict};
use regex::Regex;
use tracing::{debug, info};

/// Mentions of additional resources the stage asks to be fetched.
static AUX_RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:Scrape|Download|Visit|Access|Get data from)\s+((?:https?://[^\s<>"')\]]+)|(?:/[^\s<>"')\]]+\.(?:html|json|csv|pdf|txt|xml)))"#,
    )
    .unwrap()
});

static ORIGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(https?://[^/]+)").unwrap());

fn http_client() -> Result<reqwest::Client, GauntletError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| GauntletError::Fetch {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Script-free [`StageFetcher`] over plain GET requests.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, GauntletError> {
        Ok(Self {
            client: http_client()?,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, GauntletError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GauntletError::Fetch {
                message: format!("GET {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GauntletError::Fetch {
                message: format!("GET {url} returned {status}"),
                source: None,
            });
        }

        response.text().await.map_err(|e| GauntletError::Fetch {
            message: format!("failed to read body of {url}: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl StageFetcher for HttpFetcher {
    async fn fetch_stage(&self, url: &str) -> Result<StageDocument, GauntletError> {
        let body = self.get_text(url).await?;
        debug!(url, bytes = body.len(), "stage page fetched");

        let aux_links: Vec<String> = AUX_RESOURCE
            .captures_iter(&body)
            .map(|caps| resolve(&caps[1], url))
            .collect();
        if !aux_links.is_empty() {
            info!(url, count = aux_links.len(), "stage references auxiliary resources");
        }

        Ok(StageDocument::new(StagePayload::text_only(url, body)).with_aux_links(aux_links))
    }

    async fn fetch_resource(&self, url: &str) -> Result<String, GauntletError> {
        let body = self.get_text(url).await?;
        debug!(url, bytes = body.len(), "auxiliary resource fetched");
        Ok(body)
    }
}

/// Resolve a possibly site-relative link against the page origin.
fn resolve(link: &str, page_url: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    match ORIGIN.captures(page_url) {
        Some(caps) => format!("{}/{}", &caps[1], link.trim_start_matches('/')),
        None => link.to_string(),
    }
}

/// [`AnswerBoard`] posting submissions as JSON.
pub struct HttpBoard {
    client: reqwest::Client,
}

impl HttpBoard {
    pub fn new() -> Result<Self, GauntletError> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

#[async_trait]
impl AnswerBoard for HttpBoard {
    async fn submit(
        &self,
        endpoint: &str,
        submission: &Submission,
    ) -> Result<Verdict, GauntletError> {
        let response = self
            .client
            .post(endpoint)
            .json(submission)
            .send()
            .await
            .map_err(|e| GauntletError::Fetch {
                message: format!("POST {endpoint} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GauntletError::Fetch {
            message: format!("failed to read verdict body: {e}"),
            source: Some(Box::new(e)),
        })?;

        // Defensive parsing: only trust bodies that actually look like the
        // JSON verdict contract.
        let looks_like_json = body.trim_start().starts_with(['{', '[']);
        if !looks_like_json {
            return Err(GauntletError::Internal(format!(
                "answer board returned non-JSON response (status {status}): {}",
                snippet(&body)
            )));
        }

        serde_json::from_str::<Verdict>(&body).map_err(|e| {
            GauntletError::Internal(format!(
                "could not parse verdict JSON (status {status}): {e}; body: {}",
                snippet(&body)
            ))
        })
    }
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}
