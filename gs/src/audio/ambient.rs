//! AmbientChannel - looping background audio
//!
//! Lifecycle is independent of narration and of stage boundaries. Device
//! failures are logged and swallowed.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{AmbientDevice, AudioError};

/// Default ambient volume
pub const DEFAULT_AMBIENT_VOLUME: f32 = 0.3;

/// Background-audio channel, independent of narration
pub struct AmbientChannel {
    device: Option<Arc<dyn AmbientDevice>>,
    enabled: bool,
    playing: bool,
    volume: f32,
    volume_applied: bool,
}

impl AmbientChannel {
    pub fn new(device: Option<Arc<dyn AmbientDevice>>, enabled: bool, volume: f32) -> Self {
        debug!(has_device = device.is_some(), enabled, volume, "AmbientChannel::new: called");
        Self {
            device,
            enabled,
            playing: false,
            volume: volume.clamp(0.0, 1.0),
            volume_applied: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Begin looping playback if enabled
    pub fn start(&mut self) {
        debug!(enabled = self.enabled, "AmbientChannel::start: called");
        if !self.enabled {
            return;
        }
        self.play();
    }

    pub fn pause(&mut self) {
        debug!(playing = self.playing, "AmbientChannel::pause: called");
        if !self.playing {
            return;
        }
        self.call("pause", |d| d.pause());
        self.playing = false;
    }

    /// Continue playback if enabled and not already playing
    pub fn resume(&mut self) {
        debug!(enabled = self.enabled, playing = self.playing, "AmbientChannel::resume: called");
        if !self.enabled || self.playing {
            return;
        }
        self.play();
    }

    /// Stop playback entirely
    pub fn stop(&mut self) {
        debug!("AmbientChannel::stop: called");
        self.call("stop", |d| d.stop());
        self.playing = false;
    }

    /// Flip the enabled flag, returning the new value
    ///
    /// Turning off pauses immediately. Turning on resumes only when
    /// `session_running` (session Active and not Paused).
    pub fn toggle(&mut self, session_running: bool) -> bool {
        self.enabled = !self.enabled;
        debug!(enabled = self.enabled, session_running, "AmbientChannel::toggle: called");
        if !self.enabled {
            self.pause();
        } else if session_running {
            self.resume();
        }
        self.enabled
    }

    /// Play, sending the configured volume ahead of the first play
    fn play(&mut self) {
        let Some(device) = &self.device else {
            debug!("AmbientChannel::play: no device");
            return;
        };
        if !self.volume_applied {
            match device.set_volume(self.volume) {
                Ok(()) => self.volume_applied = true,
                Err(e) => log_failure("set_volume", &e),
            }
        }
        match device.play() {
            Ok(()) => self.playing = true,
            Err(e) => log_failure("play", &e),
        }
    }

    fn call(&self, op: &str, f: impl FnOnce(&dyn AmbientDevice) -> Result<(), AudioError>) {
        if let Some(device) = &self.device
            && let Err(e) = f(device.as_ref())
        {
            log_failure(op, &e);
        }
    }
}

fn log_failure(op: &str, error: &AudioError) {
    warn!(op, error = %error, "Ambient device call failed, continuing without background audio");
}
