//! Frequency/time-domain tap on the live audio signal
//!
//! Mirrors the byte-oriented read-out of a Web Audio analyser: a ring of the
//! most recent `fft_size` samples, time-domain bytes centred on 128, and
//! smoothed per-band magnitudes mapped from `[min_decibels, max_decibels]`
//! onto `0..=255`.

use std::f32::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lowest band centre frequency
const MIN_BAND_HZ: f32 = 50.0;

/// Highest band centre frequency (clamped to Nyquist)
const MAX_BAND_HZ: f32 = 16_000.0;

/// Analyser configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserOptions {
    /// Window length in samples; must be a power of two
    pub fft_size: usize,
    /// 0.0 = no smoothing, values close to 1.0 = heavy smoothing
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.85,
            min_decibels: -90.0,
            max_decibels: -10.0,
        }
    }
}

#[derive(Debug)]
struct AnalyserState {
    options: AnalyserOptions,
    sample_rate: u32,
    ring: Vec<f32>,
    write_pos: usize,
    filled: usize,
    smoothed: Vec<f32>,
    connected: bool,
}

impl AnalyserState {
    /// Most recent `n` samples in chronological order, zero-filled if not yet captured
    fn recent(&self, n: usize) -> Vec<f32> {
        let size = self.ring.len();
        let n = n.min(size);
        let mut out = vec![0.0; n];
        let available = self.filled.min(n);
        for i in 0..available {
            let idx = (self.write_pos + size - available + i) % size;
            out[n - available + i] = self.ring[idx];
        }
        out
    }
}

/// Cloneable handle to a shared analyser. The capture side pushes samples,
/// renderers read bytes.
#[derive(Debug, Clone)]
pub struct Analyser {
    inner: Arc<Mutex<AnalyserState>>,
}

impl Analyser {
    pub fn new(sample_rate: u32, options: AnalyserOptions) -> Self {
        let fft_size = options.fft_size.max(32).next_power_of_two();
        let options = AnalyserOptions { fft_size, ..options };
        Self {
            inner: Arc::new(Mutex::new(AnalyserState {
                options,
                sample_rate: sample_rate.max(1),
                ring: vec![0.0; fft_size],
                write_pos: 0,
                filled: 0,
                smoothed: Vec::new(),
                connected: true,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, AnalyserState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fft_size(&self) -> usize {
        self.state().options.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size() / 2
    }

    pub fn sample_rate(&self) -> u32 {
        self.state().sample_rate
    }

    /// Feed captured mono samples. Ignored once disconnected.
    pub fn push_samples(&self, samples: &[f32]) {
        let mut state = self.state();
        if !state.connected {
            return;
        }
        let size = state.ring.len();
        for &s in samples {
            let pos = state.write_pos;
            state.ring[pos] = s;
            state.write_pos = (pos + 1) % size;
        }
        state.filled = (state.filled + samples.len()).min(size);
    }

    /// Detach from the signal; subsequent pushes are dropped.
    pub fn disconnect(&self) {
        self.state().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    /// Fill `out` with the latest waveform, 128 = silence.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let samples = self.state().recent(out.len());
        let offset = out.len() - samples.len();
        out[..offset].fill(128);
        for (dst, s) in out[offset..].iter_mut().zip(samples) {
            *dst = (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8;
        }
    }

    /// Smoothed magnitude of `bands` log-spaced bands, scaled to `0..=255`.
    pub fn frequency_bands(&self, bands: usize) -> Vec<u8> {
        if bands == 0 {
            return Vec::new();
        }
        let mut state = self.state();
        let options = state.options;
        let window = state.recent(options.fft_size);
        let centres = band_centre_frequencies(bands, state.sample_rate);

        if state.smoothed.len() != bands {
            state.smoothed = vec![0.0; bands];
        }

        let tau = options.smoothing_time_constant.clamp(0.0, 1.0);
        let range = (options.max_decibels - options.min_decibels).max(f32::EPSILON);
        let mut out = Vec::with_capacity(bands);
        for (i, &freq) in centres.iter().enumerate() {
            let magnitude = goertzel_magnitude(&window, freq, state.sample_rate);
            let smoothed = tau * state.smoothed[i] + (1.0 - tau) * magnitude;
            state.smoothed[i] = smoothed;

            let db = if smoothed > 0.0 {
                20.0 * smoothed.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - options.min_decibels) / range;
            out.push(scaled.clamp(0.0, 255.0) as u8);
        }
        out
    }

    /// RMS and peak of the latest window
    pub fn levels(&self) -> (f32, f32) {
        let state = self.state();
        let window = state.recent(state.filled.min(state.options.fft_size));
        compute_levels(&window)
    }
}

/// Geometric band centres between 50 Hz and min(16 kHz, Nyquist)
pub fn band_centre_frequencies(bands: usize, sample_rate: u32) -> Vec<f32> {
    let nyquist = sample_rate as f32 / 2.0;
    let high = MAX_BAND_HZ.min(nyquist * 0.95).max(MIN_BAND_HZ * 2.0);
    if bands == 1 {
        return vec![(MIN_BAND_HZ * high).sqrt()];
    }
    let ratio = (high / MIN_BAND_HZ).powf(1.0 / (bands - 1) as f32);
    (0..bands)
        .map(|i| MIN_BAND_HZ * ratio.powi(i as i32))
        .collect()
}

/// Sine-amplitude estimate at `freq` over a Hann-windowed block.
fn goertzel_magnitude(samples: &[f32], freq: f32, sample_rate: u32) -> f32 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    let omega = 2.0 * PI * freq / sample_rate as f32;
    let coeff = 2.0 * omega.cos();
    let (mut s_prev, mut s_prev2) = (0.0f32, 0.0f32);
    for (i, &x) in samples.iter().enumerate() {
        let hann = 0.5 - 0.5 * (2.0 * PI * i as f32 / (n - 1).max(1) as f32).cos();
        let s = x * hann + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }
    let power = s_prev * s_prev + s_prev2 * s_prev2 - coeff * s_prev * s_prev2;
    // Hann coherent gain 0.5, single-sided spectrum: amplitude = 4|X|/N
    4.0 * power.max(0.0).sqrt() / n as f32
}

/// RMS and peak of a block, both clamped to [0, 1]
pub fn compute_levels(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }

    let mut peak = 0.0f32;
    let mut sum_sq = 0.0f32;
    for &s in samples {
        peak = peak.max(s.abs());
        sum_sq += s * s;
    }

    let rms = (sum_sq / samples.len() as f32).sqrt();
    (rms.clamp(0.0, 1.0), peak.clamp(0.0, 1.0))
}
