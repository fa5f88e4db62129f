//! HTTP client for the meditation backend
//!
//! Implements both ContentProvider and InsightService against the backend's
//! JSON endpoints, retrying transient failures with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ContentError, ContentProvider, HealthStatus, InsightService};
use crate::config::ApiConfig;
use crate::domain::Stage;

/// Upper bound on configured retries
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Longest single wait between retries
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct StagesResponse {
    stages: Vec<Stage>,
    #[serde(default)]
    total_duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StageContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct InsightRequest<'a> {
    text: &'a str,
    duration_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    insight: String,
}

/// Meditation backend client
pub struct HttpContentClient {
    base_url: Url,
    http: Client,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpContentClient {
    /// Create a new client from the API configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ContentError> {
        debug!(?config, "HttpContentClient::from_config: called");
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ContentError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ContentError::InvalidBaseUrl(config.base_url.clone()));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ContentError::Network)?;

        Ok(Self {
            base_url,
            http,
            max_retries: config.max_retries.min(MAX_RETRIES_LIMIT),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        })
    }

    /// Endpoint URL with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "meditation"]).extend(segments);
        }
        url
    }

    /// Delay before retry `attempt` (1-based), doubling from the initial backoff
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Send a request, retrying network errors and retryable statuses
    async fn send_with_retry<F>(&self, op: &str, build: F) -> Result<Response, ContentError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_for(attempt);
                warn!(op, attempt, backoff_ms = backoff.as_millis() as u64, "retrying after transient error");
                tokio::time::sleep(backoff).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(op, attempt, error = %e, "send_with_retry: network error");
                    last_error = Some(ContentError::Network(e));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                let error = ContentError::Status { status, body };
                if error.is_retryable() && attempt < self.max_retries {
                    debug!(op, attempt, status, "send_with_retry: retryable status");
                    last_error = Some(error);
                    continue;
                }
                debug!(op, status, "send_with_retry: API error");
                return Err(error);
            }

            debug!(op, "send_with_retry: success");
            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| ContentError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl ContentProvider for HttpContentClient {
    async fn fetch_stages(&self) -> Result<Vec<Stage>, ContentError> {
        let url = self.url(&["stages"]);
        debug!(%url, "fetch_stages: called");
        let response = self.send_with_retry("fetch_stages", || self.http.get(url.clone())).await?;
        let body: StagesResponse = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;

        debug!(
            stage_count = body.stages.len(),
            total_duration = ?body.total_duration,
            "fetch_stages: received"
        );
        Ok(body.stages)
    }

    async fn fetch_stage_content(&self, stage_id: &str) -> Result<String, ContentError> {
        let url = self.url(&["stage", stage_id, "content"]);
        debug!(%url, "fetch_stage_content: called");
        let response = self
            .send_with_retry("fetch_stage_content", || self.http.get(url.clone()))
            .await?;
        let body: StageContentResponse = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            debug!(%stage_id, %error, "fetch_stage_content: backend reported error");
            return Err(ContentError::InvalidResponse(error));
        }
        match body.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(ContentError::InvalidResponse(format!("No content for stage {}", stage_id))),
        }
    }

    async fn health(&self) -> Result<HealthStatus, ContentError> {
        let url = self.url(&["health"]);
        debug!(%url, "health: called");
        let response = self.send_with_retry("health", || self.http.get(url.clone())).await?;
        response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl InsightService for HttpContentClient {
    async fn request_insight(&self, text: &str, duration_seconds: u64) -> Result<String, ContentError> {
        let url = self.url(&["reflection"]);
        debug!(%url, text_len = text.len(), duration_seconds, "request_insight: called");
        let request = InsightRequest { text, duration_seconds };
        let response = self
            .send_with_retry("request_insight", || self.http.post(url.clone()).json(&request))
            .await?;
        let body: InsightResponse = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;
        Ok(body.insight)
    }
}
