//! Mock content provider and insight service for tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ContentError, ContentProvider, InsightService};
use crate::domain::Stage;

/// Content provider with canned stages and texts
///
/// `stages: None` makes the stage-list fetch fail. Stage ids without an
/// entry in `texts` fail their content fetch.
#[derive(Default)]
pub struct MockContentProvider {
    stages: Option<Vec<Stage>>,
    texts: HashMap<String, String>,
    delay: Duration,
    fetched: Mutex<Vec<String>>,
    completed_fetches: AtomicUsize,
}

impl MockContentProvider {
    pub fn new(stages: Option<Vec<Stage>>) -> Self {
        debug!(has_stages = stages.is_some(), "MockContentProvider::new: called");
        Self {
            stages,
            ..Default::default()
        }
    }

    /// Provider whose every call fails
    pub fn unreachable() -> Self {
        Self::new(None)
    }

    pub fn with_text(mut self, stage_id: &str, text: &str) -> Self {
        self.texts.insert(stage_id.to_string(), text.to_string());
        self
    }

    /// Delay every content fetch (uses tokio time, so paused clocks apply)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Stage ids whose content fetch was started, in order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of content fetches that ran to completion
    pub fn completed_fetches(&self) -> usize {
        self.completed_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for MockContentProvider {
    async fn fetch_stages(&self) -> Result<Vec<Stage>, ContentError> {
        debug!("MockContentProvider::fetch_stages: called");
        self.stages
            .clone()
            .ok_or_else(|| ContentError::Unavailable("mock provider unreachable".to_string()))
    }

    async fn fetch_stage_content(&self, stage_id: &str) -> Result<String, ContentError> {
        debug!(%stage_id, "MockContentProvider::fetch_stage_content: called");
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(stage_id.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed_fetches.fetch_add(1, Ordering::SeqCst);

        self.texts
            .get(stage_id)
            .cloned()
            .ok_or_else(|| ContentError::Unavailable(format!("no mock text for {}", stage_id)))
    }
}

/// Insight service returning a canned insight, or failing when `None`
#[derive(Default)]
pub struct MockInsightService {
    insight: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, u64)>>,
}

impl MockInsightService {
    pub fn new(insight: Option<&str>) -> Self {
        Self {
            insight: insight.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Text and duration of the most recent request
    pub fn last_request(&self) -> Option<(String, u64)> {
        self.last_request.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl InsightService for MockInsightService {
    async fn request_insight(&self, text: &str, duration_seconds: u64) -> Result<String, ContentError> {
        debug!(text_len = text.len(), duration_seconds, "MockInsightService::request_insight: called");
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some((text.to_string(), duration_seconds));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.insight.clone().ok_or_else(|| ContentError::Status {
            status: 500,
            body: "mock insight failure".to_string(),
        })
    }
}
