//! Headless devices for the `gs` binary
//!
//! Narration is written to the terminal instead of a speech engine, and the
//! ambient loop is tracked in the log against a configured asset path.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::*;
use tracing::{debug, info};

use super::{AmbientDevice, AudioError, SpeechDevice};

/// Prints narration lines to stdout
#[derive(Debug, Default)]
pub struct TerminalSpeech;

impl SpeechDevice for TerminalSpeech {
    fn speak(&self, text: &str) -> Result<(), AudioError> {
        debug!(text_len = text.len(), "TerminalSpeech::speak: called");
        for line in text.split("...").map(str::trim).filter(|l| !l.is_empty()) {
            println!("    {} {}", "~".cyan(), line.italic());
        }
        Ok(())
    }

    fn cancel(&self) -> Result<(), AudioError> {
        debug!("TerminalSpeech::cancel: called");
        Ok(())
    }

    fn pause(&self) -> Result<(), AudioError> {
        println!("    {}", "(narration paused)".dimmed());
        Ok(())
    }

    fn resume(&self) -> Result<(), AudioError> {
        println!("    {}", "(narration resumed)".dimmed());
        Ok(())
    }
}

/// Ambient loop bound to an audio asset on disk
///
/// With no asset, or an asset that does not exist, every call reports
/// `AudioError::Unavailable`.
#[derive(Debug)]
pub struct AssetAmbient {
    asset: Option<PathBuf>,
    playing: AtomicBool,
}

impl AssetAmbient {
    pub fn new(asset: Option<PathBuf>) -> Self {
        debug!(?asset, "AssetAmbient::new: called");
        Self {
            asset,
            playing: AtomicBool::new(false),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn asset(&self) -> Result<&PathBuf, AudioError> {
        match &self.asset {
            Some(path) if path.exists() => Ok(path),
            Some(path) => Err(AudioError::Unavailable(format!("asset not found: {}", path.display()))),
            None => Err(AudioError::Unavailable("no ambient asset configured".to_string())),
        }
    }
}

impl AmbientDevice for AssetAmbient {
    fn play(&self) -> Result<(), AudioError> {
        let asset = self.asset()?;
        info!(asset = %asset.display(), "Ambient loop playing");
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.asset()?;
        info!("Ambient loop paused");
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.playing.store(false, Ordering::SeqCst);
        self.asset()?;
        info!("Ambient loop stopped");
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        self.asset()?;
        debug!(volume, "AssetAmbient::set_volume: called");
        Ok(())
    }
}
