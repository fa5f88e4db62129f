//! Audio channels for guided sessions
//!
//! Narration and ambient audio are independent: each channel has its own
//! enabled flag and lifecycle, and neither reports state back to the
//! session controller.

mod ambient;
mod device;
pub mod mock;
mod narration;
pub mod terminal;

pub use ambient::{AmbientChannel, DEFAULT_AMBIENT_VOLUME};
pub use device::{AmbientDevice, AudioError, SpeechDevice};
pub use narration::NarrationChannel;
pub use terminal::{AssetAmbient, TerminalSpeech};
