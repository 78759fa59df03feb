//! Streaming WebM muxer on top of libwebm
//!
//! The segment is written in live mode into a non-seekable sink, so libwebm
//! never goes back to patch sizes or append cues: every byte is final once
//! written. Whatever accumulated since the last take is the next chunk, and
//! the chunks concatenated in order form a playable file.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use webm::mux::{AudioCodecId, AudioTrack, Segment, SegmentBuilder, SegmentMode, Writer};

use crate::application::ports::EncodingError;

const APP_NAME: &str = concat!("folder-recorder ", env!("CARGO_PKG_VERSION"));

/// Opus tracks in WebM always declare 48kHz, whatever the encoder input rate
const OPUS_TRACK_RATE: u32 = 48_000;

/// Byte sink shared between libwebm and the chunk reader
#[derive(Debug, Clone, Default)]
struct ChunkSink(Arc<Mutex<Vec<u8>>>);

impl ChunkSink {
    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        // Appends only, a panic mid-write cannot leave it half-updated
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer())
    }
}

impl Write for ChunkSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn init_error(e: webm::mux::Error) -> EncodingError {
    EncodingError::InitFailed(format!("WebM muxer setup failed: {}", e))
}

pub struct WebmMuxer {
    segment: Option<Segment<ChunkSink>>,
    track: AudioTrack,
    sink: ChunkSink,
    /// Rate the frame sample counts are measured in
    clock_rate: u32,
    samples_written: u64,
    frames_written: u64,
}

impl WebmMuxer {
    /// Single mono Opus track. `opus_head` becomes the CodecPrivate and
    /// `clock_rate` is the encoder input rate.
    pub fn opus(opus_head: &[u8], clock_rate: u32) -> Result<Self, EncodingError> {
        let sink = ChunkSink::default();
        let builder = SegmentBuilder::new(Writer::new_non_seek(sink.clone()))
            .and_then(|b| b.set_mode(SegmentMode::Live))
            .and_then(|b| b.set_writing_app(APP_NAME))
            .map_err(init_error)?;
        let (builder, track) = builder
            .add_audio_track(OPUS_TRACK_RATE, 1, AudioCodecId::Opus, None)
            .map_err(init_error)?;
        let segment = builder
            .set_codec_private(track, opus_head)
            .map_err(init_error)?
            .build();

        Ok(Self {
            segment: Some(segment),
            track,
            sink,
            clock_rate: clock_rate.max(1),
            samples_written: 0,
            frames_written: 0,
        })
    }

    /// Milliseconds of audio muxed so far
    pub fn duration_ms(&self) -> u64 {
        self.samples_written * 1000 / self.clock_rate as u64
    }

    /// Mux one encoded frame covering `frame_samples` samples
    pub fn add_frame(&mut self, packet: &[u8], frame_samples: usize) -> Result<(), EncodingError> {
        let timestamp_ns = self.samples_written * 1_000_000_000 / self.clock_rate as u64;
        let segment = self
            .segment
            .as_mut()
            .ok_or_else(|| EncodingError::Failed("WebM segment already finalized".to_string()))?;
        segment
            .add_frame(self.track, packet, timestamp_ns, true)
            .map_err(|e| EncodingError::Failed(format!("WebM muxing failed: {}", e)))?;

        self.samples_written += frame_samples as u64;
        self.frames_written += 1;
        Ok(())
    }

    /// Everything written since the last chunk, or `None` if there is nothing new
    pub fn take_chunk(&mut self) -> Option<Vec<u8>> {
        let chunk = self.sink.take();
        (!chunk.is_empty()).then_some(chunk)
    }

    /// Finalize the segment and return what was not taken yet. Empty when
    /// no frame was ever muxed, libwebm writes nothing before the first one.
    pub fn finish(&mut self) -> Vec<u8> {
        if let Some(segment) = self.segment.take() {
            if self.frames_written > 0 && segment.finalize(None).is_err() {
                tracing::warn!(frames = self.frames_written, "libwebm failed to finalize segment");
            }
        }
        self.sink.take()
    }
}
