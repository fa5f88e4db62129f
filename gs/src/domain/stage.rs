//! Stage - one named, timed segment of a guided session

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unique identifier for a stage within a session
pub type StageId = String;

/// Narration used when a stage id has no dedicated fallback text
pub const DEFAULT_FALLBACK_NARRATION: &str = "Take a moment to breathe and be present.";

/// Cue spoken once the last stage has finished
pub const COMPLETION_CUE: &str = "Namaste. Your meditation session is complete.";

/// A single timed segment of a guided session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique stage ID (e.g. "breathing")
    pub id: StageId,
    /// Display name
    pub name: String,
    /// Planned length in whole seconds, always > 0
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    /// Icon tag for the presentation layer
    #[serde(rename = "icon")]
    pub icon_tag: String,
    /// Short description of the stage
    pub description: String,
}

impl Stage {
    /// Create a new stage
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        duration_seconds: u64,
        icon_tag: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration_seconds,
            icon_tag: icon_tag.into(),
            description: description.into(),
        }
    }

    /// Planned length as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

/// Reasons a stage list cannot be used for a session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageListError {
    #[error("Stage list is empty")]
    Empty,

    #[error("Duplicate stage id: {0}")]
    DuplicateId(String),

    #[error("Stage {0} has zero duration")]
    ZeroDuration(String),

    #[error("Total stage duration overflows")]
    TotalOverflow,
}

/// Check that a stage list has unique ids, positive durations and a
/// representable total
pub fn validate_stages(stages: &[Stage]) -> Result<(), StageListError> {
    debug!(stage_count = stages.len(), "validate_stages: called");
    if stages.is_empty() {
        debug!("validate_stages: empty list");
        return Err(StageListError::Empty);
    }

    let mut seen = HashSet::new();
    let mut total: u64 = 0;
    for stage in stages {
        if stage.duration_seconds == 0 {
            debug!(stage_id = %stage.id, "validate_stages: zero duration");
            return Err(StageListError::ZeroDuration(stage.id.clone()));
        }
        if !seen.insert(stage.id.as_str()) {
            debug!(stage_id = %stage.id, "validate_stages: duplicate id");
            return Err(StageListError::DuplicateId(stage.id.clone()));
        }
        total = total.checked_add(stage.duration_seconds).ok_or_else(|| {
            debug!(stage_id = %stage.id, "validate_stages: total overflows");
            StageListError::TotalOverflow
        })?;
    }

    Ok(())
}

/// Sum of all planned stage durations in seconds, saturating at `u64::MAX`
pub fn total_duration_seconds(stages: &[Stage]) -> u64 {
    stages.iter().fold(0u64, |acc, s| acc.saturating_add(s.duration_seconds))
}

/// The fixed five-stage script used when the content provider is unreachable
pub fn fallback_stages() -> Vec<Stage> {
    vec![
        Stage::new("welcome", "Welcome", 30, "heart", "Setting intentions"),
        Stage::new("breathing", "Breathing", 120, "wind", "Deep breathing exercises"),
        Stage::new("bodyscan", "Body Scan", 90, "user", "Release physical tension"),
        Stage::new("visualization", "Visualization", 90, "eye", "Peaceful imagery"),
        Stage::new("closing", "Closing", 30, "sun", "Gentle return"),
    ]
}

/// Deterministic narration for a stage whose content could not be fetched
pub fn fallback_narration(stage_id: &str) -> &'static str {
    match stage_id {
        "welcome" => {
            "Welcome to your meditation session. Take a moment to find a comfortable position. \
             Close your eyes if that feels right, and let your shoulders drop away from your ears. \
             You're exactly where you need to be right now."
        }
        "breathing" => {
            "Let's begin with some deep breathing... \
             Breathe in slowly... 2... 3... 4... Hold gently... 2... 3... 4... \
             Exhale slowly... 2... 3... 4... Hold empty... 2... 3... 4... \
             Again, breathe in... letting your belly expand... Hold... feeling calm and centered... \
             Breathe out... releasing any tension... Hold... at peace... \
             One more time... deep breath in... Hold... And release completely... Rest here for a moment."
        }
        "bodyscan" => {
            "Bring your attention to the top of your head... Notice any sensations there... and let them soften... \
             Moving down to your face... relax your forehead... your eyes... your jaw... \
             Let your shoulders drop... releasing any tension you're holding... \
             Feel your arms grow heavy and relaxed... your hands... your fingers... \
             Notice your chest rising and falling... your belly soft... \
             Let relaxation flow down through your hips... your legs... all the way down to your feet... your toes... \
             Your whole body is supported... relaxed... at ease."
        }
        "visualization" => {
            "Imagine yourself in a peaceful meadow... The grass is soft beneath you... \
             a gentle breeze touches your skin... Above you, the sky is a perfect blue with soft white clouds \
             drifting by... You hear birds singing in the distance... leaves rustling gently... \
             The sun warms you just enough... you feel completely safe here... \
             This is your place of peace... always available to you... \
             Breathe in the fresh, clean air... and feel deeply at rest."
        }
        "closing" => {
            "Slowly begin to bring your awareness back to this room... \
             Gently wiggle your fingers and toes... Take a deep breath in... and let it out with a sigh... \
             When you're ready, slowly open your eyes... \
             Thank you for taking this time for yourself. \
             Carry this sense of calm with you as you continue your day."
        }
        _ => DEFAULT_FALLBACK_NARRATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_stages_are_valid() {
        let stages = fallback_stages();
        assert_eq!(stages.len(), 5);
        assert!(validate_stages(&stages).is_ok());
        assert_eq!(total_duration_seconds(&stages), 360);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_zero() {
        let dup = vec![Stage::new("a", "A", 10, "", ""), Stage::new("a", "A2", 10, "", "")];
        assert_eq!(validate_stages(&dup), Err(StageListError::DuplicateId("a".to_string())));

        let zero = vec![Stage::new("a", "A", 0, "", "")];
        assert_eq!(validate_stages(&zero), Err(StageListError::ZeroDuration("a".to_string())));

        assert_eq!(validate_stages(&[]), Err(StageListError::Empty));
    }

    #[test]
    fn test_validate_rejects_total_overflow() {
        let stages = vec![Stage::new("a", "A", u64::MAX, "", ""), Stage::new("b", "B", 1, "", "")];
        assert_eq!(validate_stages(&stages), Err(StageListError::TotalOverflow));
        assert_eq!(total_duration_seconds(&stages), u64::MAX);

        let single = vec![Stage::new("a", "A", u64::MAX, "", "")];
        assert!(validate_stages(&single).is_ok());
    }

    #[test]
    fn test_fallback_narration_known_and_unknown() {
        assert!(fallback_narration("breathing").starts_with("Let's begin"));
        assert_eq!(fallback_narration("mystery"), DEFAULT_FALLBACK_NARRATION);
    }

    #[test]
    fn test_stage_deserializes_wire_names() {
        let json = r#"{"id":"welcome","name":"Welcome","duration":30,"icon":"heart","description":"Setting intentions"}"#;
        let stage: Stage = serde_json::from_str(json).unwrap();
        assert_eq!(stage.duration_seconds, 30);
        assert_eq!(stage.icon_tag, "heart");
        assert_eq!(stage.duration(), Duration::from_secs(30));
    }
}
