//! SessionMachine - pure stage sequencer and progress state
//!
//! Every operation takes `now` from the injected clock and returns the
//! effects the controller must apply (content fetches, narration cues,
//! reflection entry). The machine itself performs no I/O, so a session can be
//! driven through any timeline in tests without waiting on a real clock.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Stage, StageId};

use super::progress::{StageTimer, overall_progress};

/// Lifecycle of a guided session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Paused,
    Complete,
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// A stage became active; its content must be fetched and narrated
    StageEntered { index: usize, stage_id: StageId },
    /// The active stage reached full progress
    StageCompleted { stage_id: StageId },
    /// The last stage finished (emitted exactly once per session)
    SessionCompleted,
    Paused { fraction: f64 },
    Resumed { fraction: f64 },
    /// Session returned to Idle; all timers and audio must be released
    Reset,
}

/// Stage sequencer plus progress tracker
#[derive(Debug, Clone)]
pub struct SessionMachine {
    status: SessionStatus,
    stages: Vec<Stage>,
    current_index: Option<usize>,
    timer: Option<StageTimer>,
    current_stage_progress: f64,
    completed_stage_ids: HashSet<StageId>,
    paused_at_fraction: f64,
    grace: Duration,
}

impl SessionMachine {
    /// Create an idle machine that waits `grace` between a finished stage and the next
    pub fn new(grace: Duration) -> Self {
        debug!(?grace, "SessionMachine::new: called");
        Self {
            status: SessionStatus::Idle,
            stages: Vec::new(),
            current_index: None,
            timer: None,
            current_stage_progress: 0.0,
            completed_stage_ids: HashSet::new(),
            paused_at_fraction: 0.0,
            grace,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.current_index.and_then(|i| self.stages.get(i))
    }

    /// Progress of the active stage as last published by a tick or transition
    pub fn current_stage_progress(&self) -> f64 {
        self.current_stage_progress
    }

    pub fn completed_stage_ids(&self) -> &HashSet<StageId> {
        &self.completed_stage_ids
    }

    pub fn paused_at_fraction(&self) -> f64 {
        self.paused_at_fraction
    }

    /// Sum of all planned stage durations in seconds
    pub fn total_duration_seconds(&self) -> u64 {
        crate::domain::total_duration_seconds(&self.stages)
    }

    /// Time-weighted completion across the whole session
    pub fn overall_progress(&self) -> f64 {
        overall_progress(
            &self.stages,
            &self.completed_stage_ids,
            self.current_index,
            self.current_stage_progress,
        )
    }

    /// Begin a session at stage 0 (Idle → Active)
    pub fn start(&mut self, stages: Vec<Stage>, now: Duration) -> Vec<SessionEffect> {
        debug!(stage_count = stages.len(), ?now, status = ?self.status, "SessionMachine::start: called");
        if self.status != SessionStatus::Idle {
            debug!("SessionMachine::start: not idle, ignoring");
            return Vec::new();
        }

        self.stages = stages;
        self.completed_stage_ids.clear();
        self.paused_at_fraction = 0.0;
        self.status = SessionStatus::Active;
        info!(stage_count = self.stages.len(), "Session started");

        if self.stages.is_empty() {
            debug!("SessionMachine::start: no stages, completing immediately");
            return self.complete();
        }
        self.enter(0, now)
    }

    /// Sample the clock and apply any stage transitions it implies
    ///
    /// Handles arbitrarily large jumps: every stage whose time (plus grace)
    /// has fully elapsed is completed and advanced past in order.
    pub fn tick(&mut self, now: Duration) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        while self.status == SessionStatus::Active {
            let Some(index) = self.current_index else { break };
            let Some(timer) = self.timer.as_mut() else { break };

            let fraction = timer.fraction(now);
            self.current_stage_progress = fraction;
            if fraction < 1.0 {
                break;
            }

            if !timer.is_finished() {
                let deadline = timer.deadline();
                timer.mark_finished(deadline);
                let stage_id = self.stages[index].id.clone();
                debug!(%stage_id, "SessionMachine::tick: stage completed");
                self.completed_stage_ids.insert(stage_id.clone());
                effects.push(SessionEffect::StageCompleted { stage_id });
            }

            if !timer.grace_elapsed(now, self.grace) {
                break;
            }

            let next_start = timer.finished_at().map(|at| at.saturating_add(self.grace)).unwrap_or(now);
            effects.extend(self.step_forward(next_start));
        }

        effects
    }

    /// Move to the next stage, or complete after the last one
    pub fn advance(&mut self, now: Duration) -> Vec<SessionEffect> {
        debug!(?now, status = ?self.status, "SessionMachine::advance: called");
        if self.status != SessionStatus::Active {
            debug!("SessionMachine::advance: not active, ignoring");
            return Vec::new();
        }
        self.step_forward(now)
    }

    /// Jump to any stage; an index past the last stage completes the session
    pub fn skip_to(&mut self, index: usize, now: Duration) -> Vec<SessionEffect> {
        debug!(index, ?now, status = ?self.status, "SessionMachine::skip_to: called");
        if self.status != SessionStatus::Active {
            debug!("SessionMachine::skip_to: not active, ignoring");
            return Vec::new();
        }
        if self.current_index == Some(index) {
            debug!("SessionMachine::skip_to: already on this stage");
            return Vec::new();
        }
        if index >= self.stages.len() {
            debug!("SessionMachine::skip_to: past last stage, completing");
            return self.complete();
        }
        self.enter(index, now)
    }

    /// Freeze the active stage (Active → Paused)
    pub fn pause(&mut self, now: Duration) -> Vec<SessionEffect> {
        debug!(?now, status = ?self.status, "SessionMachine::pause: called");
        if self.status != SessionStatus::Active {
            debug!("SessionMachine::pause: not active, ignoring");
            return Vec::new();
        }
        let Some(timer) = self.timer.as_mut() else {
            return Vec::new();
        };

        let fraction = timer.pause(now);
        self.current_stage_progress = fraction;
        self.paused_at_fraction = fraction;
        self.status = SessionStatus::Paused;
        info!(fraction, "Session paused");
        vec![SessionEffect::Paused { fraction }]
    }

    /// Continue from the captured fraction (Paused → Active)
    pub fn resume(&mut self, now: Duration) -> Vec<SessionEffect> {
        debug!(?now, status = ?self.status, "SessionMachine::resume: called");
        if self.status != SessionStatus::Paused {
            debug!("SessionMachine::resume: not paused, ignoring");
            return Vec::new();
        }
        let Some(timer) = self.timer.as_mut() else {
            return Vec::new();
        };

        let fraction = timer.resume(now);
        self.current_stage_progress = fraction;
        self.status = SessionStatus::Active;
        info!(fraction, "Session resumed");
        vec![SessionEffect::Resumed { fraction }]
    }

    /// Return to Idle from any state
    pub fn stop(&mut self) -> Vec<SessionEffect> {
        debug!(status = ?self.status, "SessionMachine::stop: called");
        if self.status == SessionStatus::Idle {
            debug!("SessionMachine::stop: already idle");
            return Vec::new();
        }

        self.status = SessionStatus::Idle;
        self.stages.clear();
        self.current_index = None;
        self.timer = None;
        self.current_stage_progress = 0.0;
        self.completed_stage_ids.clear();
        self.paused_at_fraction = 0.0;
        info!("Session reset to idle");
        vec![SessionEffect::Reset]
    }

    fn step_forward(&mut self, start_at: Duration) -> Vec<SessionEffect> {
        let next = self.current_index.map(|i| i + 1).unwrap_or(0);
        debug!(next, "SessionMachine::step_forward: called");
        if next >= self.stages.len() {
            return self.complete();
        }
        self.enter(next, start_at)
    }

    fn enter(&mut self, index: usize, now: Duration) -> Vec<SessionEffect> {
        let stage = &self.stages[index];
        info!(index, stage_id = %stage.id, duration_seconds = stage.duration_seconds, "Stage started");

        let effect = SessionEffect::StageEntered {
            index,
            stage_id: stage.id.clone(),
        };
        self.timer = Some(StageTimer::start(stage.duration(), now));
        self.current_index = Some(index);
        self.current_stage_progress = 0.0;
        vec![effect]
    }

    fn complete(&mut self) -> Vec<SessionEffect> {
        info!(
            completed = self.completed_stage_ids.len(),
            total = self.stages.len(),
            "Session complete"
        );
        self.status = SessionStatus::Complete;
        self.current_index = None;
        self.timer = None;
        self.current_stage_progress = 0.0;
        vec![SessionEffect::SessionCompleted]
    }
}
