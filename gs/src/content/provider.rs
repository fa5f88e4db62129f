//! Collaborator traits for stage content and reflection insight

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Stage;

use super::ContentError;

/// Health report from the content backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub stages: usize,
    pub total_duration: u64,
}

/// Source of the stage list and per-stage narration text
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Ordered stage list for a new session
    async fn fetch_stages(&self) -> Result<Vec<Stage>, ContentError>;

    /// Narration text for one stage
    async fn fetch_stage_content(&self, stage_id: &str) -> Result<String, ContentError>;

    /// Backend health, when the provider exposes it
    async fn health(&self) -> Result<HealthStatus, ContentError> {
        Err(ContentError::Unavailable("health check not supported".to_string()))
    }
}

/// Generates an insight from a post-session reflection
#[async_trait]
pub trait InsightService: Send + Sync {
    async fn request_insight(&self, text: &str, duration_seconds: u64) -> Result<String, ContentError>;
}

/// Provider and insight service that are never reachable
///
/// Used for offline sessions: every call fails, so the session runs on the
/// fallback script and fallback strings.
#[derive(Debug, Default)]
pub struct OfflineContent;

#[async_trait]
impl ContentProvider for OfflineContent {
    async fn fetch_stages(&self) -> Result<Vec<Stage>, ContentError> {
        Err(ContentError::Unavailable("offline".to_string()))
    }

    async fn fetch_stage_content(&self, _stage_id: &str) -> Result<String, ContentError> {
        Err(ContentError::Unavailable("offline".to_string()))
    }
}

#[async_trait]
impl InsightService for OfflineContent {
    async fn request_insight(&self, _text: &str, _duration_seconds: u64) -> Result<String, ContentError> {
        Err(ContentError::Unavailable("offline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_content_always_fails() {
        let offline = OfflineContent;
        assert!(offline.fetch_stages().await.is_err());
        assert!(offline.fetch_stage_content("welcome").await.is_err());
        assert!(offline.request_insight("hi", 60).await.is_err());
        assert!(offline.health().await.is_err());
    }
}
