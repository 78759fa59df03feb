//! Audio analysis domain module

mod analyser;
mod constraints;

pub use analyser::{band_centre_frequencies, compute_levels, Analyser, AnalyserOptions};
pub use constraints::AudioConstraints;
