//! Recording infrastructure module
//!
//! WebM encoding of captured audio: Opus frames, resampling to the encoder
//! rate, libwebm muxing and the streaming encoder task.

mod opus_codec;
mod resample;
mod webm;
mod webm_encoder;

pub use webm_encoder::WebmEncoder;
