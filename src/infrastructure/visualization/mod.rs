//! Live audio visualization adapters

mod noop;
mod terminal;

pub use noop::{NoOpVisualizer, NoOpVisualizerFactory};
pub use terminal::{format_level, render_bands, TerminalVisualizer, TerminalVisualizerFactory};

use crate::application::ports::VisualizerFactory;

/// Terminal spectrum when enabled, nothing otherwise
pub fn create_visualizer_factory(enabled: bool) -> Box<dyn VisualizerFactory> {
    if enabled {
        Box::new(TerminalVisualizerFactory)
    } else {
        Box::new(NoOpVisualizerFactory)
    }
}
