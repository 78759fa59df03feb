//! Analysis graph attached to a capture stream
//!
//! Source -> analyser -> gain(0). The gain stage stays muted so the
//! microphone is never monitored through the speakers.

use std::sync::Arc;

use crate::domain::audio::{Analyser, AnalyserOptions};

use super::ports::CaptureStream;

#[derive(Debug)]
pub struct AudioGraph {
    analyser: Analyser,
    output_gain: f32,
    closed: bool,
}

impl AudioGraph {
    /// Tap `stream` with a new analyser
    pub fn connect(stream: &CaptureStream, options: AnalyserOptions) -> Self {
        let analyser = Analyser::new(stream.sample_rate(), options);
        stream.bus().subscribe(Arc::new(analyser.clone()));
        Self {
            analyser,
            output_gain: 0.0,
            closed: false,
        }
    }

    pub fn analyser(&self) -> Analyser {
        self.analyser.clone()
    }

    /// Gain applied to the monitor output, always 0
    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Disconnect the analyser. Returns true only for the call that closed it.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.analyser.disconnect();
        self.closed = true;
        tracing::debug!("Audio graph closed");
        true
    }
}

impl Drop for AudioGraph {
    fn drop(&mut self) {
        self.close();
    }
}
