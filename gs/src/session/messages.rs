//! Session messages
//!
//! Commands for the session actor. Every command carries a oneshot reply
//! except `Shutdown`.

use tokio::sync::oneshot;

use super::controller::SessionSnapshot;
use super::error::SessionResponse;

/// Commands sent to the session actor
#[derive(Debug)]
pub enum SessionCommand {
    // Lifecycle
    Start {
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    Stop {
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    Pause {
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    Resume {
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    // Navigation
    Advance {
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    SkipTo {
        index: usize,
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    // Audio channels
    ToggleNarration {
        reply: oneshot::Sender<SessionResponse<bool>>,
    },
    ToggleAmbient {
        reply: oneshot::Sender<SessionResponse<bool>>,
    },

    // Reflection
    /// Replied once the insight (or its fallback) is stored
    SubmitReflection {
        text: String,
        reply: oneshot::Sender<SessionResponse<String>>,
    },
    SkipReflection {
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    Finish {
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    // Query
    Snapshot {
        reply: oneshot::Sender<SessionResponse<SessionSnapshot>>,
    },

    Shutdown,
}
