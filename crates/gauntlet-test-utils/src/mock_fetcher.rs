// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock fetch layer keyed by URL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use gauntlet_core::{GauntletError, StageDocument, StageFetcher};

/// A mock fetcher serving scripted stage documents and resources by URL.
pub struct MockFetcher {
    stages: Arc<Mutex<HashMap<String, StageDocument>>>,
    resources: Arc<Mutex<HashMap<String, String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            stages: Arc::new(Mutex::new(HashMap::new())),
            resources: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Script a stage document for a URL.
    pub async fn add_stage(&self, url: impl Into<String>, document: StageDocument) {
        self.stages.lock().await.insert(url.into(), document);
    }

    /// Script an auxiliary resource for a URL.
    pub async fn add_resource(&self, url: impl Into<String>, body: impl Into<String>) {
        self.resources.lock().await.insert(url.into(), body.into());
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageFetcher for MockFetcher {
    async fn fetch_stage(&self, url: &str) -> Result<StageDocument, GauntletError> {
        self.stages
            .lock()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| GauntletError::Fetch {
                message: format!("no scripted stage for {url}"),
                source: None,
            })
    }

    async fn fetch_resource(&self, url: &str) -> Result<String, GauntletError> {
        self.resources
            .lock()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| GauntletError::Fetch {
                message: format!("no scripted resource for {url}"),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_core::StagePayload;

    #[tokio::test]
    async fn scripted_stage_round_trip() {
        let fetcher = MockFetcher::new();
        fetcher
            .add_stage(
                "http://q.test/stage1",
                StageDocument::new(StagePayload::text_only("http://q.test/stage1", "hello")),
            )
            .await;

        let doc = fetcher.fetch_stage("http://q.test/stage1").await.unwrap();
        assert_eq!(doc.payload.text, "hello");

        let err = fetcher.fetch_stage("http://q.test/unknown").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn scripted_resource_round_trip() {
        let fetcher = MockFetcher::new();
        fetcher.add_resource("http://q.test/data.csv", "a,b\n1,2").await;
        let body = fetcher.fetch_resource("http://q.test/data.csv").await.unwrap();
        assert_eq!(body, "a,b\n1,2");
    }
}
