//! Reflection capture - post-session free text and its insight

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::ContentError;
use crate::session::SessionError;

/// Shown when the insight service cannot produce an insight
pub const FALLBACK_INSIGHT: &str = "Your reflection has been saved.";

/// Reflection captured after the last stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionState {
    /// Text submitted by the user
    pub free_text: String,
    /// Insight returned for the text; empty until one arrives
    pub insight: String,
    /// True while an insight request is in flight
    pub submitting: bool,
}

impl ReflectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_insight(&self) -> bool {
        !self.insight.is_empty()
    }

    /// Validate and record a submission
    ///
    /// Empty or whitespace-only text is rejected without touching state.
    pub fn begin_submit(&mut self, text: &str) -> Result<(), SessionError> {
        debug!(text_len = text.len(), submitting = self.submitting, "ReflectionState::begin_submit: called");
        if text.trim().is_empty() {
            debug!("ReflectionState::begin_submit: empty text rejected");
            return Err(SessionError::EmptyReflection);
        }
        if self.submitting {
            return Err(SessionError::AlreadySubmitting);
        }
        self.free_text = text.to_string();
        self.submitting = true;
        Ok(())
    }

    /// Store the service result, substituting the fallback on failure
    pub fn finish_submit(&mut self, result: Result<String, ContentError>) -> &str {
        self.insight = match result {
            Ok(insight) if !insight.trim().is_empty() => insight,
            Ok(_) => {
                warn!("Insight service returned empty insight, using fallback");
                FALLBACK_INSIGHT.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Insight service failed, using fallback");
                FALLBACK_INSIGHT.to_string()
            }
        };
        self.submitting = false;
        &self.insight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_rejected_without_change() {
        let mut reflection = ReflectionState::new();
        assert_eq!(reflection.begin_submit(""), Err(SessionError::EmptyReflection));
        assert_eq!(reflection.begin_submit("   \n\t"), Err(SessionError::EmptyReflection));
        assert_eq!(reflection, ReflectionState::new());
    }

    #[test]
    fn test_submit_then_insight() {
        let mut reflection = ReflectionState::new();
        reflection.begin_submit("I noticed my breath").unwrap();
        assert!(reflection.submitting);
        assert_eq!(reflection.begin_submit("again"), Err(SessionError::AlreadySubmitting));

        let insight = reflection.finish_submit(Ok("Breath anchors you.".to_string())).to_string();
        assert_eq!(insight, "Breath anchors you.");
        assert!(!reflection.submitting);
        assert!(reflection.has_insight());
        assert_eq!(reflection.free_text, "I noticed my breath");
    }

    #[test]
    fn test_failure_uses_fallback() {
        let mut reflection = ReflectionState::new();
        reflection.begin_submit("text").unwrap();
        reflection.finish_submit(Err(ContentError::Unavailable("down".to_string())));
        assert_eq!(reflection.insight, FALLBACK_INSIGHT);

        let mut reflection = ReflectionState::new();
        reflection.begin_submit("text").unwrap();
        reflection.finish_submit(Ok("  ".to_string()));
        assert_eq!(reflection.insight, FALLBACK_INSIGHT);
    }
}
