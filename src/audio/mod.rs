//! Audio playback for narration, rewards and the rejection cue.

pub mod engine;

pub use engine::{AudioEngine, Playback};

use thiserror::Error;

/// Errors that can occur during audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("sound file not found: {0}")]
    SoundNotFound(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),
}

/// Audio configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioConfig {
    /// Master enable for all audio
    pub enabled: bool,
    /// Master volume (0-100)
    pub volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 80,
        }
    }
}
