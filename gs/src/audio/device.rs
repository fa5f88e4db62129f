//! Audio device capability traits
//!
//! Both devices are platform-provided and best-effort. Calls are
//! fire-and-forget: they return once the request is dispatched and report
//! nothing back about playback.

use thiserror::Error;

/// Errors from audio devices
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio device unavailable: {0}")]
    Unavailable(String),
}

/// Text-to-speech output
pub trait SpeechDevice: Send + Sync {
    /// Start narrating `text` without waiting for it to finish
    fn speak(&self, text: &str) -> Result<(), AudioError>;

    /// Drop any in-flight utterance
    fn cancel(&self) -> Result<(), AudioError>;

    /// Suspend the in-flight utterance
    fn pause(&self) -> Result<(), AudioError>;

    /// Continue a suspended utterance
    fn resume(&self) -> Result<(), AudioError>;
}

/// Looping background audio output
pub trait AmbientDevice: Send + Sync {
    fn play(&self) -> Result<(), AudioError>;

    fn pause(&self) -> Result<(), AudioError>;

    fn stop(&self) -> Result<(), AudioError>;

    /// Volume in [0.0, 1.0]
    fn set_volume(&self, volume: f32) -> Result<(), AudioError>;
}
