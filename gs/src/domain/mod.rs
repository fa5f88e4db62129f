//! Domain types for guided sessions

mod stage;

pub use stage::{
    COMPLETION_CUE, DEFAULT_FALLBACK_NARRATION, Stage, StageId, StageListError, fallback_narration, fallback_stages,
    total_duration_seconds, validate_stages,
};
