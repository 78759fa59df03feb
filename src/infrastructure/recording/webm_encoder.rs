//! Streaming WebM encoder
//!
//! Subscribes to the capture bus and runs a tokio task that resamples,
//! encodes and muxes frames, emitting a container chunk every timeslice.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::application::ports::{
    CaptureStream, EncoderEvent, EncoderOptions, EncoderSession, EncodingError, FrameSink,
    MediaEncoder,
};
use crate::domain::recording::RecordingFormat;

use super::opus_codec::OpusCodec;
use super::resample::StreamResampler;
use super::webm::WebmMuxer;

/// Timer intervals below this are clamped
const MIN_TIMESLICE: StdDuration = StdDuration::from_millis(10);

/// Forwards captured frames into the worker's queue
struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<f32>>,
}

impl FrameSink for ChannelSink {
    fn push(&self, samples: &[f32]) {
        // Closed queue means the worker already finished
        let _ = self.tx.send(samples.to_vec());
    }
}

/// `MediaEncoder` writing Opus into WebM for both `audio/webm;codecs=opus`
/// and the plain `audio/webm` fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct WebmEncoder;

impl WebmEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaEncoder for WebmEncoder {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        RecordingFormat::from_mime(mime_type).is_some()
    }

    async fn start(
        &self,
        stream: &CaptureStream,
        options: EncoderOptions,
    ) -> Result<EncoderSession, EncodingError> {
        let mime = options.format.mime_type();
        let codec = OpusCodec::new(options.sample_rate, options.bitrate)?;
        let muxer = WebmMuxer::opus(&codec.opus_head(), codec.sample_rate())?;
        let resampler = StreamResampler::new(stream.sample_rate(), codec.sample_rate())?;

        tracing::info!(
            format = mime,
            input_rate = stream.sample_rate(),
            output_rate = codec.sample_rate(),
            timeslice_ms = options.timeslice.as_millis(),
            "Starting encoder"
        );

        let (samples_tx, samples_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        stream
            .bus()
            .subscribe(Arc::new(ChannelSink { tx: samples_tx }));

        let worker = EncoderWorker::new(codec, resampler, muxer);
        let timeslice = options.timeslice.as_std().max(MIN_TIMESLICE);
        tokio::spawn(worker.run(samples_rx, stop_rx, events_tx, timeslice));

        Ok(EncoderSession::new(stop_tx, events_rx))
    }
}

struct EncoderWorker {
    codec: OpusCodec,
    resampler: StreamResampler,
    muxer: WebmMuxer,
    /// Resampled samples not yet filling a whole frame
    pending: Vec<f32>,
}

impl EncoderWorker {
    fn new(codec: OpusCodec, resampler: StreamResampler, muxer: WebmMuxer) -> Self {
        Self {
            codec,
            resampler,
            muxer,
            pending: Vec::new(),
        }
    }

    async fn run(
        mut self,
        mut samples: mpsc::UnboundedReceiver<Vec<f32>>,
        mut stop: oneshot::Receiver<()>,
        events: mpsc::UnboundedSender<EncoderEvent>,
        timeslice: StdDuration,
    ) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut input_open = true;

        // A dropped session counts as a stop request
        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut stop => break self.drain(&mut samples),
                received = samples.recv(), if input_open => match received {
                    Some(block) => {
                        if let Err(e) = self.feed(&block) {
                            samples.close();
                            break Err(e);
                        }
                    }
                    None => {
                        tracing::debug!("Capture input closed");
                        input_open = false;
                    }
                },
                _ = ticker.tick() => {
                    if let Some(chunk) = self.muxer.take_chunk() {
                        let _ = events.send(EncoderEvent::DataAvailable(chunk));
                    }
                }
            }
        };

        self.conclude(outcome, &events);
    }

    /// Deliver the muxed tail, then the error if any, then `Stopped`.
    /// A failed session still hands out everything muxed before the failure.
    fn conclude(
        mut self,
        outcome: Result<(), EncodingError>,
        events: &mpsc::UnboundedSender<EncoderEvent>,
    ) {
        let tail = self.muxer.finish();
        if !tail.is_empty() {
            let _ = events.send(EncoderEvent::DataAvailable(tail));
        }

        match outcome {
            Ok(()) => {
                tracing::debug!(duration_ms = self.muxer.duration_ms(), "Encoder finished");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    duration_ms = self.muxer.duration_ms(),
                    "Encoder failed, delivering what was muxed"
                );
                let _ = events.send(EncoderEvent::Error(e));
            }
        }
        let _ = events.send(EncoderEvent::Stopped);
    }

    fn feed(&mut self, samples: &[f32]) -> Result<(), EncodingError> {
        self.resampler.push(samples, &mut self.pending)?;
        self.encode_whole_frames()
    }

    fn encode_whole_frames(&mut self) -> Result<(), EncodingError> {
        let size = self.codec.frame_size();
        while self.pending.len() >= size {
            let frame: Vec<f32> = self.pending.drain(..size).collect();
            let packet = self.codec.encode(&frame)?;
            self.muxer.add_frame(&packet, size)?;
        }
        Ok(())
    }

    /// Consume whatever is queued and flush the pipeline, zero-padding the last frame
    fn drain(&mut self, samples: &mut mpsc::UnboundedReceiver<Vec<f32>>) -> Result<(), EncodingError> {
        while let Ok(block) = samples.try_recv() {
            self.feed(&block)?;
        }
        samples.close();

        self.resampler.flush(&mut self.pending)?;
        self.encode_whole_frames()?;

        if !self.pending.is_empty() {
            let size = self.codec.frame_size();
            let mut frame = std::mem::take(&mut self.pending);
            frame.resize(size, 0.0);
            let packet = self.codec.encode(&frame)?;
            self.muxer.add_frame(&packet, size)?;
        }
        Ok(())
    }
}
