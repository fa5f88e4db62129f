//! NarrationChannel - spoken stage guidance
//!
//! Owns the single speech device for the session. Only one utterance may be
//! in flight: every `speak` cancels the previous one first, whether or not
//! the channel is muted.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{AudioError, SpeechDevice};

/// Spoken-guidance channel, independent of ambient audio
pub struct NarrationChannel {
    device: Option<Arc<dyn SpeechDevice>>,
    enabled: bool,
    in_flight: bool,
    suspended: bool,
    held_text: Option<String>,
}

impl NarrationChannel {
    /// Create a channel; `None` means no speech device is available
    pub fn new(device: Option<Arc<dyn SpeechDevice>>, enabled: bool) -> Self {
        debug!(has_device = device.is_some(), enabled, "NarrationChannel::new: called");
        Self {
            device,
            enabled,
            in_flight: false,
            suspended: false,
            held_text: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an utterance was dispatched and not cancelled since
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Most recent text handed to the channel, spoken or not
    pub fn held_text(&self) -> Option<&str> {
        self.held_text.as_deref()
    }

    /// Cancel any in-flight narration, hold `text`, and speak it if enabled
    ///
    /// Returns true when the text was dispatched to the device.
    pub fn speak(&mut self, text: &str) -> bool {
        debug!(text_len = text.len(), enabled = self.enabled, "NarrationChannel::speak: called");
        self.cancel();
        self.held_text = Some(text.to_string());

        if !self.enabled {
            debug!("NarrationChannel::speak: muted, holding text only");
            return false;
        }

        let Some(device) = &self.device else {
            debug!("NarrationChannel::speak: no device");
            return false;
        };
        match device.speak(text) {
            Ok(()) => {
                self.in_flight = true;
                true
            }
            Err(e) => {
                log_failure("speak", &e);
                false
            }
        }
    }

    /// Stop the current utterance
    pub fn cancel(&mut self) {
        debug!(in_flight = self.in_flight, "NarrationChannel::cancel: called");
        if let Some(device) = &self.device
            && let Err(e) = device.cancel()
        {
            log_failure("cancel", &e);
        }
        self.in_flight = false;
        self.suspended = false;
    }

    /// Disable future cues and silence the current one
    pub fn mute(&mut self) {
        debug!("NarrationChannel::mute: called");
        self.enabled = false;
        self.cancel();
    }

    /// Enable future cues; the interrupted line is not replayed
    pub fn unmute(&mut self) {
        debug!("NarrationChannel::unmute: called");
        self.enabled = true;
    }

    /// Flip the enabled flag, returning the new value
    pub fn toggle(&mut self) -> bool {
        if self.enabled {
            self.mute();
        } else {
            self.unmute();
        }
        self.enabled
    }

    /// Suspend the in-flight utterance without cancelling it
    pub fn pause_channel(&mut self) {
        debug!(in_flight = self.in_flight, "NarrationChannel::pause_channel: called");
        if !self.in_flight || self.suspended {
            return;
        }
        if let Some(device) = &self.device
            && let Err(e) = device.pause()
        {
            log_failure("pause", &e);
        }
        self.suspended = true;
    }

    /// Continue a suspended utterance
    pub fn resume_channel(&mut self) {
        debug!(suspended = self.suspended, "NarrationChannel::resume_channel: called");
        if !self.suspended {
            return;
        }
        if let Some(device) = &self.device
            && let Err(e) = device.resume()
        {
            log_failure("resume", &e);
        }
        self.suspended = false;
    }

    /// Release the device at session end; the enabled flag is kept
    pub fn release(&mut self) {
        debug!("NarrationChannel::release: called");
        self.cancel();
        self.held_text = None;
    }
}

fn log_failure(op: &str, error: &AudioError) {
    warn!(op, error = %error, "Narration device call failed, continuing without speech");
}
