//! Microphone port: live capture streams and their tracks

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::{Analyser, AudioConstraints};

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Access to the device was refused; carries the platform's message
    #[error("{0}")]
    PermissionDenied(String),

    #[error("No input device available")]
    NoDevice,

    #[error("Unsupported input configuration: {0}")]
    UnsupportedConfig(String),

    #[error("Failed to open input stream: {0}")]
    StreamFailed(String),
}

/// Receiver of captured mono frames.
///
/// Called from the capture thread, so implementations must not block.
pub trait FrameSink: Send + Sync {
    fn push(&self, samples: &[f32]);
}

impl FrameSink for Analyser {
    fn push(&self, samples: &[f32]) {
        self.push_samples(samples);
    }
}

/// Fan-out of captured frames to every subscribed sink
#[derive(Clone, Default)]
pub struct FrameBus {
    sinks: Arc<Mutex<Vec<Arc<dyn FrameSink>>>>,
}

impl FrameBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn FrameSink>) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn publish(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter() {
            sink.push(samples);
        }
    }

    /// Drop every subscriber
    pub fn clear(&self) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for FrameBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A single device track. Stopping releases the hardware.
pub trait MediaTrack: Send + Sync {
    fn label(&self) -> &str;

    /// Release the device. Only called once per track.
    fn stop(&mut self);
}

/// A live capture: mono frames at `sample_rate` published on `bus`
pub struct CaptureStream {
    sample_rate: u32,
    bus: FrameBus,
    tracks: Vec<Box<dyn MediaTrack>>,
    live: Vec<bool>,
}

impl CaptureStream {
    pub fn new(sample_rate: u32, bus: FrameBus, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        let live = vec![true; tracks.len()];
        Self {
            sample_rate,
            bus,
            tracks,
            live,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bus(&self) -> &FrameBus {
        &self.bus
    }

    pub fn track_labels(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.label()).collect()
    }

    pub fn is_live(&self) -> bool {
        self.live.iter().any(|&l| l)
    }

    /// Stop every live track and detach all subscribers. Safe to call repeatedly.
    pub fn stop_tracks(&mut self) {
        for (track, live) in self.tracks.iter_mut().zip(self.live.iter_mut()) {
            if *live {
                tracing::debug!(track = track.label(), "Stopping capture track");
                track.stop();
                *live = false;
            }
        }
        self.bus.clear();
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

impl fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureStream")
            .field("sample_rate", &self.sample_rate)
            .field("tracks", &self.track_labels())
            .field("live", &self.is_live())
            .finish()
    }
}

/// Port for microphone access
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Acquire the microphone. The returned stream is live until its
    /// tracks are stopped or it is dropped.
    async fn open(&self, constraints: AudioConstraints) -> Result<CaptureStream, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTrack(Arc<AtomicUsize>);

    impl MediaTrack for CountingTrack {
        fn label(&self) -> &str {
            "test"
        }

        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Collector(Mutex<Vec<f32>>);

    impl FrameSink for Collector {
        fn push(&self, samples: &[f32]) {
            self.0.lock().unwrap().extend_from_slice(samples);
        }
    }

    #[test]
    fn stop_tracks_is_idempotent() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut stream = CaptureStream::new(
            48_000,
            FrameBus::new(),
            vec![Box::new(CountingTrack(Arc::clone(&stops)))],
        );

        stream.stop_tracks();
        stream.stop_tracks();
        drop(stream);

        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bus_fans_out_until_cleared() {
        let bus = FrameBus::new();
        let a = Arc::new(Collector(Mutex::new(Vec::new())));
        let b = Arc::new(Collector(Mutex::new(Vec::new())));
        bus.subscribe(a.clone());
        bus.subscribe(b.clone());

        bus.publish(&[0.1, 0.2]);
        bus.clear();
        bus.publish(&[0.3]);

        assert_eq!(*a.0.lock().unwrap(), vec![0.1, 0.2]);
        assert_eq!(*b.0.lock().unwrap(), vec![0.1, 0.2]);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
