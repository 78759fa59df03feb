//! Media encoder port
//!
//! An encoder turns a live [`CaptureStream`] into container chunks delivered
//! as [`EncoderEvent`]s. Stopping is a request; the encoder finishes the
//! remaining data, emits its last chunk and then `Stopped`.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::domain::recording::{Duration, RecordingFormat};

use super::microphone::CaptureStream;

/// Encoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Encoder initialization failed: {0}")]
    InitFailed(String),

    #[error("Encoding failed: {0}")]
    Failed(String),
}

/// Events emitted by a running encoder, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A chunk of the container byte stream
    DataAvailable(Vec<u8>),
    /// The encoder failed; `Stopped` follows
    Error(EncodingError),
    /// Final event, all chunks have been delivered
    Stopped,
}

/// Parameters for one encoding session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    pub format: RecordingFormat,
    /// Interval between `DataAvailable` events
    pub timeslice: Duration,
    /// Rate the captured audio is resampled to before encoding
    pub sample_rate: u32,
    /// Target bitrate
    pub bitrate: u32,
}

/// Handle to a running encoder
#[derive(Debug)]
pub struct EncoderSession {
    stop_tx: Option<oneshot::Sender<()>>,
    events: mpsc::UnboundedReceiver<EncoderEvent>,
    finished: bool,
}

impl EncoderSession {
    pub fn new(
        stop_tx: oneshot::Sender<()>,
        events: mpsc::UnboundedReceiver<EncoderEvent>,
    ) -> Self {
        Self {
            stop_tx: Some(stop_tx),
            events,
            finished: false,
        }
    }

    /// Ask the encoder to finalize. Later calls do nothing.
    pub fn request_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // Receiver gone means the worker already exited
            let _ = tx.send(());
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_tx.is_none()
    }

    /// Whether `Stopped` was observed or the channel closed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next event; `None` once the encoder is gone. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<EncoderEvent> {
        if self.finished {
            return None;
        }
        let event = self.events.recv().await;
        if matches!(event, None | Some(EncoderEvent::Stopped)) {
            self.finished = true;
        }
        event
    }
}

/// Port for media encoding
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Capability probe for a MIME type
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Begin encoding the stream. Samples are taken from the stream's bus.
    async fn start(
        &self,
        stream: &CaptureStream,
        options: EncoderOptions,
    ) -> Result<EncoderSession, EncodingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_finishes_on_stopped() {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = EncoderSession::new(stop_tx, rx);

        session.request_stop();
        session.request_stop();
        assert!(stop_rx.await.is_ok());
        assert!(session.stop_requested());

        tx.send(EncoderEvent::DataAvailable(vec![1])).unwrap();
        tx.send(EncoderEvent::Stopped).unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![2])).unwrap();

        assert_eq!(
            session.next_event().await,
            Some(EncoderEvent::DataAvailable(vec![1]))
        );
        assert_eq!(session.next_event().await, Some(EncoderEvent::Stopped));
        assert!(session.is_finished());
        assert_eq!(session.next_event().await, None);
    }

    #[tokio::test]
    async fn closed_channel_finishes_session() {
        let (stop_tx, _stop_rx) = oneshot::channel();
        let (tx, rx) = mpsc::unbounded_channel::<EncoderEvent>();
        let mut session = EncoderSession::new(stop_tx, rx);
        drop(tx);

        assert_eq!(session.next_event().await, None);
        assert!(session.is_finished());
    }
}
