//! Progress tracking - per-stage timer and derived overall progress
//!
//! The stage timer works against a virtual start time. Pausing captures the
//! current fraction; resuming shifts the virtual start forward by the paused
//! span, so elapsed time continues exactly where it stopped.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::domain::{Stage, StageId};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PauseMark {
    at: Duration,
    fraction: f64,
}

/// Elapsed-time tracker for the active stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageTimer {
    duration: Duration,
    started_at: Duration,
    finished_at: Option<Duration>,
    paused: Option<PauseMark>,
}

impl StageTimer {
    /// Start timing a stage of the given length at `now`
    pub fn start(duration: Duration, now: Duration) -> Self {
        debug!(?duration, ?now, "StageTimer::start: called");
        Self {
            duration,
            started_at: now,
            finished_at: None,
            paused: None,
        }
    }

    /// Fractional completion in [0,1]
    pub fn fraction(&self, now: Duration) -> f64 {
        if let Some(mark) = self.paused {
            return mark.fraction;
        }
        if self.finished_at.is_some() {
            return 1.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Whether the stage has been marked as fully elapsed
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    /// Virtual instant at which the stage reaches 1.0
    pub fn deadline(&self) -> Duration {
        self.started_at.saturating_add(self.duration)
    }

    pub fn finished_at(&self) -> Option<Duration> {
        self.finished_at
    }

    /// Record the moment the stage reached 1.0
    pub fn mark_finished(&mut self, now: Duration) {
        if self.finished_at.is_none() {
            debug!(?now, "StageTimer::mark_finished: stage finished");
            self.finished_at = Some(now);
        }
    }

    /// True once a finished stage has waited out the grace delay
    pub fn grace_elapsed(&self, now: Duration, grace: Duration) -> bool {
        if self.paused.is_some() {
            return false;
        }
        match self.finished_at {
            Some(at) => now >= at.saturating_add(grace),
            None => false,
        }
    }

    /// Freeze progress, returning the captured fraction
    pub fn pause(&mut self, now: Duration) -> f64 {
        if let Some(mark) = self.paused {
            debug!(fraction = mark.fraction, "StageTimer::pause: already paused");
            return mark.fraction;
        }
        let fraction = self.fraction(now);
        debug!(fraction, ?now, "StageTimer::pause: captured");
        self.paused = Some(PauseMark { at: now, fraction });
        fraction
    }

    /// Continue from the captured fraction, returning it
    pub fn resume(&mut self, now: Duration) -> f64 {
        let Some(mark) = self.paused.take() else {
            debug!("StageTimer::resume: not paused");
            return self.fraction(now);
        };
        let paused_for = now.saturating_sub(mark.at);
        self.started_at = self.started_at.saturating_add(paused_for);
        if let Some(finished) = self.finished_at.as_mut() {
            *finished = finished.saturating_add(paused_for);
        }
        debug!(fraction = mark.fraction, ?paused_for, "StageTimer::resume: virtual start shifted");
        mark.fraction
    }
}

/// Time-weighted completion across all stages
///
/// The active stage contributes only its fractional progress, even if its id
/// is also in `completed` (after a backwards skip).
pub fn overall_progress(
    stages: &[Stage],
    completed: &HashSet<StageId>,
    current: Option<usize>,
    current_fraction: f64,
) -> f64 {
    let total = crate::domain::total_duration_seconds(stages);
    if total == 0 {
        return 0.0;
    }

    let done: u64 = stages
        .iter()
        .enumerate()
        .filter(|(i, s)| Some(*i) != current && completed.contains(&s.id))
        .fold(0u64, |acc, (_, s)| acc.saturating_add(s.duration_seconds));

    let active = current
        .and_then(|i| stages.get(i))
        .map(|s| current_fraction.clamp(0.0, 1.0) * s.duration_seconds as f64)
        .unwrap_or(0.0);

    ((done as f64 + active) / total as f64).clamp(0.0, 1.0)
}
