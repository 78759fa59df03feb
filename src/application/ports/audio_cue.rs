//! Audio cue port
//!
//! Short tones marking recording start, stop and failures.

use async_trait::async_trait;
use thiserror::Error;

/// Cue kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCueType {
    /// Rising beep (880Hz, 150ms)
    RecordingStart,
    /// Falling beep (440Hz, 150ms)
    RecordingStop,
    /// Double low beep (330Hz, 2x75ms with a 50ms gap)
    Error,
}

/// Errors that can occur during audio cue playback
#[derive(Error, Debug)]
pub enum AudioCueError {
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),
}

#[async_trait]
pub trait AudioCue: Send + Sync {
    async fn play(&self, cue_type: AudioCueType) -> Result<(), AudioCueError>;
}

#[async_trait]
impl AudioCue for Box<dyn AudioCue> {
    async fn play(&self, cue_type: AudioCueType) -> Result<(), AudioCueError> {
        self.as_ref().play(cue_type).await
    }
}
