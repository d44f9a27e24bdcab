//! Audio engine built on rodio.
//!
//! The game's audio is file playback with end-of-cue reactions: narration
//! gates the timeline, the rejection cue gates input, the cheer gates the
//! reward overlay. rodio has no completion callback, so playback hands out
//! a [`Playback`] handle the UI loop polls once per frame.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::{AudioConfig, AudioError};

/// Owns the output device.
pub struct AudioEngine {
    // Dropping the stream kills every sink attached to it
    _stream: OutputStream,
    handle: OutputStreamHandle,
    config: AudioConfig,
}

impl AudioEngine {
    pub fn new(config: AudioConfig) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::DeviceNotAvailable(e.to_string()))?;
        tracing::info!("audio engine initialized");
        Ok(Self {
            _stream: stream,
            handle,
            config,
        })
    }

    /// Play a sound file from disk; returns a handle to poll for the end of
    /// playback.
    pub fn play_file(&self, path: &Path) -> Result<Playback, AudioError> {
        let file = File::open(path)
            .map_err(|_| AudioError::SoundNotFound(path.display().to_string()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| AudioError::PlaybackFailed(e.to_string()))?;

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AudioError::PlaybackFailed(e.to_string()))?;
        sink.set_volume(self.effective_volume());
        sink.append(source);

        Ok(Playback { sink })
    }

    fn effective_volume(&self) -> f32 {
        if self.config.enabled {
            self.config.volume.min(100) as f32 / 100.0
        } else {
            0.0
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.config.volume = volume.min(100);
    }
}

/// Handle to a running sound.
pub struct Playback {
    sink: Sink,
}

impl Playback {
    /// True once the cue has played out (or was stopped).
    pub fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    /// Stop playback immediately.
    pub fn stop(&self) {
        self.sink.stop();
    }

    pub fn pause(&self) {
        self.sink.pause();
    }
}
