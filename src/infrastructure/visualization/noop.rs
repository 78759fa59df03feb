//! Visualizer that draws nothing

use crate::application::ports::{Visualizer, VisualizerFactory, VisualizerOptions};
use crate::domain::audio::Analyser;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpVisualizer;

impl Visualizer for NoOpVisualizer {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn destroy(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpVisualizerFactory;

impl VisualizerFactory for NoOpVisualizerFactory {
    fn create(&self, _analyser: Analyser, _options: VisualizerOptions) -> Box<dyn Visualizer> {
        Box::new(NoOpVisualizer)
    }
}
