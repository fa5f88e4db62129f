//! Recording audio devices for tests

use std::sync::Mutex;

use tracing::debug;

use super::{AmbientDevice, AudioError, SpeechDevice};

/// A call observed by [`RecordingSpeech`]
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechCall {
    Speak(String),
    Cancel,
    Pause,
    Resume,
}

/// Speech device that records every call
#[derive(Default)]
pub struct RecordingSpeech {
    calls: Mutex<Vec<SpeechCall>>,
    fail: bool,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device whose every call fails after being recorded
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts passed to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SpeechCall::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SpeechCall) -> Result<(), AudioError> {
        debug!(?call, "RecordingSpeech::record: called");
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        if self.fail {
            return Err(AudioError::Unavailable("speech synthesis not supported".to_string()));
        }
        Ok(())
    }
}

impl SpeechDevice for RecordingSpeech {
    fn speak(&self, text: &str) -> Result<(), AudioError> {
        self.record(SpeechCall::Speak(text.to_string()))
    }

    fn cancel(&self) -> Result<(), AudioError> {
        self.record(SpeechCall::Cancel)
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.record(SpeechCall::Pause)
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.record(SpeechCall::Resume)
    }
}

/// A call observed by [`RecordingAmbient`]
#[derive(Debug, Clone, PartialEq)]
pub enum AmbientCall {
    Play,
    Pause,
    Stop,
    SetVolume(f32),
}

/// Ambient device that records every call
#[derive(Default)]
pub struct RecordingAmbient {
    calls: Mutex<Vec<AmbientCall>>,
    unavailable: bool,
}

impl RecordingAmbient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device with no audio asset: every call fails
    pub fn unavailable() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    pub fn calls(&self) -> Vec<AmbientCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: AmbientCall) -> Result<(), AudioError> {
        debug!(?call, "RecordingAmbient::record: called");
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        if self.unavailable {
            return Err(AudioError::Unavailable("ambient asset missing".to_string()));
        }
        Ok(())
    }
}

impl AmbientDevice for RecordingAmbient {
    fn play(&self) -> Result<(), AudioError> {
        self.record(AmbientCall::Play)
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.record(AmbientCall::Pause)
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.record(AmbientCall::Stop)
    }

    fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        self.record(AmbientCall::SetVolume(volume))
    }
}
