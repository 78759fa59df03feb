//! Rodio-based audio cues
//!
//! Synthesized tones played on the default output device.

use std::time::Duration;

use async_trait::async_trait;
use rodio::source::{SineWave, Source, Zero};
use rodio::{OutputStream, Sink};

use crate::application::ports::{AudioCue, AudioCueError, AudioCueType};

const AMPLITUDE: f32 = 0.25;

/// (frequency Hz, length ms); a zero frequency is a pause
type Note = (f32, u64);

const START: &[Note] = &[(880.0, 150)];
const STOP: &[Note] = &[(440.0, 150)];
const ERROR: &[Note] = &[(330.0, 75), (0.0, 50), (330.0, 75)];

#[derive(Debug, Default, Clone, Copy)]
pub struct RodioAudioCue;

impl RodioAudioCue {
    pub fn new() -> Self {
        Self
    }

    fn notes(cue_type: AudioCueType) -> &'static [Note] {
        match cue_type {
            AudioCueType::RecordingStart => START,
            AudioCueType::RecordingStop => STOP,
            AudioCueType::Error => ERROR,
        }
    }
}

#[async_trait]
impl AudioCue for RodioAudioCue {
    async fn play(&self, cue_type: AudioCueType) -> Result<(), AudioCueError> {
        let notes = Self::notes(cue_type);
        // Output streams block; keep them off the runtime threads
        tokio::task::spawn_blocking(move || play_notes(notes))
            .await
            .map_err(|e| AudioCueError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Sine tone with a short fade-in so it does not click
fn tone(freq: f32, duration_ms: u64) -> impl Source<Item = f32> + Send {
    let fade_ms = (duration_ms / 5).min(30);
    SineWave::new(freq)
        .take_duration(Duration::from_millis(duration_ms))
        .fade_in(Duration::from_millis(fade_ms))
        .amplify(AMPLITUDE)
}

fn play_notes(notes: &[Note]) -> Result<(), AudioCueError> {
    let (_stream, handle) = OutputStream::try_default()
        .map_err(|e| AudioCueError::DeviceNotAvailable(e.to_string()))?;
    let sink = Sink::try_new(&handle).map_err(|e| AudioCueError::PlaybackFailed(e.to_string()))?;

    for &(freq, ms) in notes {
        if freq > 0.0 {
            sink.append(tone(freq, ms));
        } else {
            sink.append(Zero::<f32>::new(1, 44_100).take_duration(Duration::from_millis(ms)));
        }
    }

    sink.sleep_until_end();
    Ok(())
}
