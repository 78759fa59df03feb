//! Capture-side DSP applied before frames reach the bus
//!
//! Noise gate with hold/release, then slow automatic gain control. Both
//! operate on mono blocks as delivered by the device callback.

use crate::domain::audio::{compute_levels, AudioConstraints};

/// RMS the gain control steers toward (about -20 dBFS)
const AGC_TARGET_RMS: f32 = 0.1;
const AGC_MIN_GAIN: f32 = 0.25;
const AGC_MAX_GAIN: f32 = 8.0;
/// Per-block smoothing when raising / lowering gain
const AGC_RISE: f32 = 0.02;
const AGC_FALL: f32 = 0.3;
/// Blocks quieter than this leave the gain alone
const AGC_SILENCE_RMS: f32 = 1e-3;

/// Gate opens above roughly -50 dBFS
const GATE_THRESHOLD_RMS: f32 = 0.003;
const GATE_HOLD_MS: u32 = 200;
const GATE_RELEASE_MS: u32 = 60;

#[derive(Debug)]
pub struct CaptureProcessor {
    noise_gate: bool,
    auto_gain: bool,
    gain: f32,
    gate_gain: f32,
    hold_samples: u32,
    hold_remaining: u32,
    release_step: f32,
}

impl CaptureProcessor {
    pub fn new(sample_rate: u32, constraints: AudioConstraints) -> Self {
        let release_samples = (sample_rate * GATE_RELEASE_MS / 1000).max(1);
        Self {
            noise_gate: constraints.noise_suppression,
            auto_gain: constraints.auto_gain_control,
            gain: 1.0,
            gate_gain: 1.0,
            hold_samples: sample_rate * GATE_HOLD_MS / 1000,
            hold_remaining: 0,
            release_step: 1.0 / release_samples as f32,
        }
    }

    /// Whether any processing is enabled
    pub fn is_active(&self) -> bool {
        self.noise_gate || self.auto_gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Process one block in place
    pub fn process(&mut self, block: &mut [f32]) {
        if block.is_empty() {
            return;
        }
        if self.noise_gate {
            self.apply_gate(block);
        }
        if self.auto_gain {
            self.apply_gain(block);
        }
    }

    fn apply_gate(&mut self, block: &mut [f32]) {
        let (rms, _) = compute_levels(block);
        let open = if rms >= GATE_THRESHOLD_RMS {
            self.hold_remaining = self.hold_samples;
            true
        } else if self.hold_remaining > 0 {
            self.hold_remaining = self.hold_remaining.saturating_sub(block.len() as u32);
            true
        } else {
            false
        };

        for sample in block.iter_mut() {
            if open {
                self.gate_gain = 1.0;
            } else {
                self.gate_gain = (self.gate_gain - self.release_step).max(0.0);
            }
            *sample *= self.gate_gain;
        }
    }

    fn apply_gain(&mut self, block: &mut [f32]) {
        let (rms, _) = compute_levels(block);
        if rms > AGC_SILENCE_RMS {
            let desired = (AGC_TARGET_RMS / rms).clamp(AGC_MIN_GAIN, AGC_MAX_GAIN);
            let rate = if desired < self.gain { AGC_FALL } else { AGC_RISE };
            self.gain += (desired - self.gain) * rate;
        }
        for sample in block.iter_mut() {
            *sample = (*sample * self.gain).clamp(-1.0, 1.0);
        }
    }
}

/// Average interleaved frames down to mono
pub fn downmix<T, F>(data: &[T], channels: usize, out: &mut Vec<f32>, convert: F)
where
    T: Copy,
    F: Fn(T) -> f32,
{
    out.clear();
    if channels <= 1 {
        out.extend(data.iter().map(|&s| convert(s)));
        return;
    }
    for frame in data.chunks_exact(channels) {
        let sum: f32 = frame.iter().map(|&s| convert(s)).sum();
        out.push(sum / channels as f32);
    }
}
