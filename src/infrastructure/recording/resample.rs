//! Streaming mono resampler on top of rubato

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::EncodingError;

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;
/// Bound on zero-padded passes when flushing
const MAX_FLUSH_PASSES: usize = 64;

/// Converts between rates in arbitrary block sizes, keeping total output
/// length proportional to the input.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
    ratio: f64,
    input_total: u64,
    output_total: u64,
    skip: usize,
}

impl StreamResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self, EncodingError> {
        let inner = if input_rate == output_rate {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    input_rate as usize,
                    output_rate as usize,
                    CHUNK_SIZE,
                    SUB_CHUNKS,
                    1,
                )
                .map_err(|e| EncodingError::InitFailed(format!("Resampler init failed: {}", e)))?,
            )
        };
        let skip = inner.as_ref().map(|r| r.output_delay()).unwrap_or(0);

        Ok(Self {
            inner,
            pending: Vec::new(),
            ratio: output_rate as f64 / input_rate.max(1) as f64,
            input_total: 0,
            output_total: 0,
            skip,
        })
    }

    pub fn is_passthrough(&self) -> bool {
        self.inner.is_none()
    }

    /// Feed input, appending whatever output is ready to `out`
    pub fn push(&mut self, samples: &[f32], out: &mut Vec<f32>) -> Result<(), EncodingError> {
        self.input_total += samples.len() as u64;
        if self.inner.is_none() {
            self.output_total += samples.len() as u64;
            out.extend_from_slice(samples);
            return Ok(());
        }

        self.pending.extend_from_slice(samples);
        loop {
            let needed = match &self.inner {
                Some(r) => r.input_frames_next(),
                None => break,
            };
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            self.process(chunk, out, u64::MAX)?;
        }
        Ok(())
    }

    /// Push out the tail, zero-padding the last block
    pub fn flush(&mut self, out: &mut Vec<f32>) -> Result<(), EncodingError> {
        let Some(first_needed) = self.inner.as_ref().map(|r| r.input_frames_next()) else {
            return Ok(());
        };
        let expected = (self.input_total as f64 * self.ratio).round() as u64;
        let mut needed = first_needed;

        for _ in 0..MAX_FLUSH_PASSES {
            if self.output_total >= expected {
                break;
            }
            let mut chunk = std::mem::take(&mut self.pending);
            chunk.resize(needed, 0.0);
            self.process(chunk, out, expected)?;
            needed = match &self.inner {
                Some(r) => r.input_frames_next(),
                None => break,
            };
        }
        self.pending.clear();
        Ok(())
    }

    fn process(&mut self, chunk: Vec<f32>, out: &mut Vec<f32>, limit: u64) -> Result<(), EncodingError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(());
        };
        let input = vec![chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| EncodingError::Failed(format!("Resampling failed: {}", e)))?;
        let Some(channel) = resampled.into_iter().next() else {
            return Ok(());
        };

        let skipped = self.skip.min(channel.len());
        self.skip -= skipped;
        let available = &channel[skipped..];
        let room = limit.saturating_sub(self.output_total) as usize;
        let take = available.len().min(room);
        out.extend_from_slice(&available[..take]);
        self.output_total += take as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_passes_through() {
        let mut resampler = StreamResampler::new(48_000, 48_000).unwrap();
        assert!(resampler.is_passthrough());
        let mut out = Vec::new();
        resampler.push(&[0.1, 0.2], &mut out).unwrap();
        resampler.flush(&mut out).unwrap();
        assert_eq!(out, vec![0.1, 0.2]);
    }

    #[test]
    fn output_length_follows_ratio() {
        let mut resampler = StreamResampler::new(44_100, 48_000).unwrap();
        let mut out = Vec::new();
        // Uneven block sizes, 1 second in total
        for block in [441usize, 3000, 10_000, 30_659] {
            resampler.push(&vec![0.0; block], &mut out).unwrap();
        }
        resampler.flush(&mut out).unwrap();
        assert_eq!(out.len(), 48_000);
    }

    #[test]
    fn downsampling_keeps_a_tone() {
        let input: Vec<f32> = (0..48_000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect();
        let mut resampler = StreamResampler::new(48_000, 16_000).unwrap();
        let mut out = Vec::new();
        resampler.push(&input, &mut out).unwrap();
        resampler.flush(&mut out).unwrap();

        assert_eq!(out.len(), 16_000);
        let peak = out[1000..15_000].iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.4 && peak < 0.6);
    }
}
