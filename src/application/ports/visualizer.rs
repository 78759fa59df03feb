//! Visualizer port
//!
//! Renders a live view of an [`Analyser`]. The controller produces nothing
//! from it; it only drives the lifecycle.

use crate::domain::audio::Analyser;
use crate::domain::recording::Duration;

/// Construction options for a visualizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizerOptions {
    /// Number of frequency bands drawn
    pub bands: usize,
    /// Redraw interval
    pub refresh: Duration,
}

impl Default for VisualizerOptions {
    fn default() -> Self {
        Self {
            bands: 32,
            refresh: Duration::from_millis(50),
        }
    }
}

/// A running render loop
pub trait Visualizer: Send + Sync {
    fn start(&mut self);
    fn stop(&mut self);
    /// Tear down the render loop. Idempotent.
    fn destroy(&mut self);
}

/// Builds visualizers bound to an analyser
pub trait VisualizerFactory: Send + Sync {
    fn create(&self, analyser: Analyser, options: VisualizerOptions) -> Box<dyn Visualizer>;
}

impl VisualizerFactory for Box<dyn VisualizerFactory> {
    fn create(&self, analyser: Analyser, options: VisualizerOptions) -> Box<dyn Visualizer> {
        self.as_ref().create(analyser, options)
    }
}
