//! Opus frames for WebM audio tracks

use crate::application::ports::EncodingError;
use crate::domain::config::ENCODER_SAMPLE_RATES;

/// Largest packet libopus will produce
const MAX_PACKET: usize = 4000;

/// Encoder lookahead at 48kHz, announced as pre-skip
const PRE_SKIP: u16 = 312;

/// Mono Opus encoder working on 20ms frames at its input rate
pub struct OpusCodec {
    encoder: opus::Encoder,
    sample_rate: u32,
    packet: Vec<u8>,
}

impl OpusCodec {
    pub fn new(sample_rate: u32, bitrate: u32) -> Result<Self, EncodingError> {
        if !ENCODER_SAMPLE_RATES.contains(&sample_rate) {
            return Err(EncodingError::InitFailed(format!(
                "Opus cannot encode at {} Hz",
                sample_rate
            )));
        }

        let mut encoder =
            opus::Encoder::new(sample_rate, opus::Channels::Mono, opus::Application::Audio)
                .map_err(|e| EncodingError::InitFailed(e.to_string()))?;

        let bitrate = i32::try_from(bitrate).unwrap_or(i32::MAX);
        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate))
            .map_err(|e| EncodingError::InitFailed(e.to_string()))?;
        encoder
            .set_vbr(true)
            .map_err(|e| EncodingError::InitFailed(e.to_string()))?;

        Ok(Self {
            encoder,
            sample_rate,
            packet: vec![0u8; MAX_PACKET],
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per 20ms frame
    pub fn frame_size(&self) -> usize {
        self.sample_rate as usize / 50
    }

    /// `OpusHead` identification header, the track's CodecPrivate
    pub fn opus_head(&self) -> Vec<u8> {
        let mut head = Vec::with_capacity(19);
        head.extend_from_slice(b"OpusHead");
        head.push(1); // version
        head.push(1); // mono
        head.extend_from_slice(&PRE_SKIP.to_le_bytes());
        head.extend_from_slice(&self.sample_rate.to_le_bytes());
        head.extend_from_slice(&0i16.to_le_bytes()); // output gain
        head.push(0); // mapping family
        head
    }

    pub fn encode(&mut self, frame: &[f32]) -> Result<Vec<u8>, EncodingError> {
        let len = self
            .encoder
            .encode_float(frame, &mut self.packet)
            .map_err(|e| EncodingError::Failed(format!("Opus encoding failed: {}", e)))?;
        Ok(self.packet[..len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opus_head_records_input_rate() {
        let head = OpusCodec::new(16_000, 32_000).unwrap().opus_head();
        assert_eq!(head.len(), 19);
        assert!(head.starts_with(b"OpusHead"));
        assert_eq!(u32::from_le_bytes([head[12], head[13], head[14], head[15]]), 16_000);
    }

    #[test]
    fn frames_are_twenty_ms() {
        assert_eq!(OpusCodec::new(48_000, 128_000).unwrap().frame_size(), 960);
        assert_eq!(OpusCodec::new(16_000, 32_000).unwrap().frame_size(), 320);
    }

    #[test]
    fn rejects_rates_opus_cannot_take() {
        let err = OpusCodec::new(44_100, 128_000).err().unwrap();
        assert!(matches!(err, EncodingError::InitFailed(_)));
    }

    #[test]
    fn encodes_silence() {
        let mut codec = OpusCodec::new(48_000, 128_000).unwrap();
        let packet = codec.encode(&[0.0; 960]).unwrap();
        assert!(!packet.is_empty());
    }
}
