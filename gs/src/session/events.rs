//! Session events - broadcast notifications for observers
//!
//! The controller emits an event for every lifecycle change. Observers
//! (terminal renderer, UI) subscribe; emitting with no subscribers is fine.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::StageId;

/// Default channel capacity (events)
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A session lifecycle notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        session_id: String,
        stage_count: usize,
        total_seconds: u64,
    },
    StageStarted {
        index: usize,
        stage_id: StageId,
        name: String,
    },
    /// Stage narration text is available; `spoken` is false when muted or no device
    StageContentReady {
        stage_id: StageId,
        text: String,
        spoken: bool,
        fallback: bool,
    },
    StageCompleted {
        stage_id: StageId,
    },
    Paused {
        fraction: f64,
    },
    Resumed {
        fraction: f64,
    },
    NarrationToggled {
        enabled: bool,
    },
    AmbientToggled {
        enabled: bool,
    },
    SessionCompleted,
    InsightReady {
        insight: String,
    },
    SessionReset,
}

impl SessionEvent {
    /// Short name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::StageStarted { .. } => "stage_started",
            SessionEvent::StageContentReady { .. } => "stage_content_ready",
            SessionEvent::StageCompleted { .. } => "stage_completed",
            SessionEvent::Paused { .. } => "paused",
            SessionEvent::Resumed { .. } => "resumed",
            SessionEvent::NarrationToggled { .. } => "narration_toggled",
            SessionEvent::AmbientToggled { .. } => "ambient_toggled",
            SessionEvent::SessionCompleted => "session_completed",
            SessionEvent::InsightReady { .. } => "insight_ready",
            SessionEvent::SessionReset => "session_reset",
        }
    }
}

/// Fan-out of session events to any number of subscribers
#[derive(Clone)]
pub struct SessionEventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "SessionEventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event; dropped if nobody is listening
    pub fn emit(&self, event: SessionEvent) {
        debug!(event_type = event.event_type(), "SessionEventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Receive events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        debug!("SessionEventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
