//! Live spectrum drawn on an indicatif spinner line

use std::time::Duration as StdDuration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use crate::application::ports::{Visualizer, VisualizerFactory, VisualizerOptions};
use crate::domain::audio::Analyser;

const BAR_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One glyph per band, scaled from the analyser's byte magnitudes
pub fn render_bands(bands: &[u8]) -> String {
    bands
        .iter()
        .map(|&b| BAR_GLYPHS[(b as usize * BAR_GLYPHS.len()) / 256])
        .collect()
}

/// Peak level as dBFS text, floored at -60
pub fn format_level(peak: f32) -> String {
    let db = if peak > 0.0 { 20.0 * peak.log10() } else { f32::NEG_INFINITY };
    format!("{:>4.0} dB", db.max(-60.0))
}

pub struct TerminalVisualizer {
    analyser: Analyser,
    options: VisualizerOptions,
    bar: Option<ProgressBar>,
    task: Option<JoinHandle<()>>,
    destroyed: bool,
}

impl TerminalVisualizer {
    pub fn new(analyser: Analyser, options: VisualizerOptions) -> Self {
        Self {
            analyser,
            options,
            bar: None,
            task: None,
            destroyed: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    fn spawn_render_loop(&self, bar: ProgressBar) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, visualizer not started");
            return None;
        };

        let analyser = self.analyser.clone();
        let bands = self.options.bands.max(1);
        let refresh = self.options.refresh.as_std().max(StdDuration::from_millis(10));
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(refresh);
            loop {
                ticker.tick().await;
                if !analyser.is_connected() {
                    break;
                }
                let spectrum = render_bands(&analyser.frequency_bands(bands));
                let (_, peak) = analyser.levels();
                bar.set_message(format!("{} {}", spectrum, format_level(peak)));
            }
        }))
    }
}

impl Visualizer for TerminalVisualizer {
    fn start(&mut self) {
        if self.destroyed || self.task.is_some() {
            return;
        }

        let bar = ProgressBar::new_spinner();
        // Template is a literal; a parse failure only loses the styling
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("●○ ")
            .template("{spinner:.red} {msg}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(StdDuration::from_millis(500));

        self.task = self.spawn_render_loop(bar.clone());
        self.bar = Some(bar);
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.destroyed = true;
        tracing::trace!("Visualizer destroyed");
    }
}

impl Drop for TerminalVisualizer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalVisualizerFactory;

impl VisualizerFactory for TerminalVisualizerFactory {
    fn create(&self, analyser: Analyser, options: VisualizerOptions) -> Box<dyn Visualizer> {
        Box::new(TerminalVisualizer::new(analyser, options))
    }
}
