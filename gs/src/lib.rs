//! GuidedSession - staged meditation sessions with narration and reflection
//!
//! A session walks an ordered list of timed stages. Each stage fetches its
//! narration from a content provider and speaks it; looping ambient audio
//! runs underneath; after the last stage the user may submit a reflection
//! and receive a short insight.
//!
//! # Core Concepts
//!
//! - **Injected Clock**: Stage timing is derived from a monotonic clock, so
//!   sessions can be driven through virtual time in tests
//! - **Effects, not I/O**: The state machine returns effects; the controller
//!   performs them
//! - **Always a Fallback**: Every collaborator failure degrades to local
//!   content and never blocks stage progression
//! - **Independent Channels**: Narration and ambient audio mute, pause and
//!   release separately
//!
//! # Modules
//!
//! - [`domain`] - Stages, validation and the fallback script
//! - [`session`] - State machine, controller and actor handle
//! - [`audio`] - Speech and ambient device traits and channels
//! - [`content`] - Content provider and insight service clients
//! - [`reflection`] - Post-session reflection state
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod audio;
pub mod cli;
pub mod config;
pub mod content;
pub mod domain;
pub mod reflection;
pub mod session;

// Re-export commonly used types
pub use audio::{AmbientChannel, AmbientDevice, AudioError, NarrationChannel, SpeechDevice};
pub use config::{AmbientConfig, ApiConfig, Config, SessionConfig};
pub use content::{ContentError, ContentProvider, HttpContentClient, InsightService, OfflineContent};
pub use domain::{Stage, StageId, fallback_stages};
pub use reflection::{FALLBACK_INSIGHT, ReflectionState};
pub use session::{
    Clock, Collaborators, SessionController, SessionError, SessionEvent, SessionHandle, SessionMachine,
    SessionOptions, SessionSnapshot, SessionStatus, TokioClock,
};
