//! Guided session orchestration
//!
//! `SessionMachine` is the pure sequencer; `SessionController` applies its
//! effects to the audio channels, content collaborators and reflection state;
//! `SessionHandle` drives a controller from a single actor task.

mod clock;
mod controller;
mod error;
mod events;
mod handle;
mod machine;
mod messages;
mod progress;

pub use clock::{Clock, ManualClock, TokioClock};
pub use controller::{
    Collaborators, ContentReady, ControllerInbox, InsightReady, SessionController, SessionOptions, SessionSnapshot,
};
pub use error::{SessionError, SessionResponse};
pub use events::{DEFAULT_EVENT_CAPACITY, SessionEvent, SessionEventBus};
pub use handle::SessionHandle;
pub use machine::{SessionEffect, SessionMachine, SessionStatus};
pub use messages::SessionCommand;
pub use progress::{StageTimer, overall_progress};
