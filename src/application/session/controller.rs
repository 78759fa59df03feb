//! Recording session controller
//!
//! Drives Idle -> Requesting -> Recording -> Stopping -> Idle, owns every
//! resource of the active recording and hands finished recordings to the
//! persistence protocol.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::application::audio_graph::AudioGraph;
use crate::application::blob_store::{BlobStore, ObjectUrl};
use crate::application::persistence::PersistenceProtocol;
use crate::application::ports::{
    AudioCue, AudioCueType, CaptureStream, Downloader, EncoderEvent, EncoderOptions,
    EncoderSession, FolderHandle, FolderPicker, MediaEncoder, Microphone, NotificationIcon,
    Notifier, Visualizer, VisualizerFactory, VisualizerOptions,
};
use crate::domain::audio::{Analyser, AnalyserOptions, AudioConstraints};
use crate::domain::config::AppConfig;
use crate::domain::persistence::{FolderRetryPolicy, SaveOutcome};
use crate::domain::recording::{ChunkBuffer, Duration, RecordingFormat, RecordingResult};
use crate::domain::session::{InvalidStateTransition, SessionState, SessionStatus};

use super::error::SessionError;

const NOTIFICATION_TITLE: &str = "Folder Recorder";

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Chunk cadence requested from the encoder
    pub timeslice: Duration,
    /// Encoder output rate
    pub sample_rate: u32,
    pub bitrate: u32,
    pub constraints: AudioConstraints,
    /// Bound on microphone and folder acquisition
    pub permission_timeout: Duration,
    /// Bound on a folder write and on waiting for the encoder to finalize
    pub write_timeout: Duration,
    /// Consecutive failed folder writes before the folder is dropped, 0 = never
    pub folder_retry_limit: u32,
    /// Automatic stop
    pub max_duration: Option<Duration>,
    pub enable_notify: bool,
    pub enable_cues: bool,
    pub analyser: AnalyserOptions,
    pub visualizer: VisualizerOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::defaults())
    }
}

impl ControllerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeslice: config.timeslice_or_default(),
            sample_rate: config.sample_rate_or_default(),
            bitrate: config.bitrate_or_default(),
            constraints: config.constraints_or_default(),
            permission_timeout: config.permission_timeout_or_default(),
            write_timeout: config.write_timeout_or_default(),
            folder_retry_limit: config.folder_retry_limit_or_default(),
            max_duration: config.max_duration(),
            enable_notify: config.notify_or_default(),
            enable_cues: config.audio_cues_or_default(),
            analyser: AnalyserOptions::default(),
            visualizer: VisualizerOptions::default(),
        }
    }
}

/// Hooks for the hosting view
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct SessionCallbacks {
    /// Called on every status change
    pub on_status: Option<Box<dyn Fn(SessionStatus) + Send + Sync>>,
    /// Called once for every error the session catches
    pub on_error: Option<Box<dyn Fn(&SessionError) + Send + Sync>>,
    /// Called when a recording landed in the folder or the downloads
    pub on_saved: Option<Box<dyn Fn(&SaveOutcome) + Send + Sync>>,
    /// Called with the folder name when the retry policy gives up on it
    pub on_folder_released: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

/// The external collaborators a controller is built from
pub struct SessionPorts<M, E, V, D, N, A> {
    pub microphone: M,
    pub encoder: E,
    pub visualizers: V,
    pub downloader: D,
    pub notifier: N,
    pub cues: A,
}

/// Resources owned by the recording in flight
struct ActiveRecording {
    stream: CaptureStream,
    graph: AudioGraph,
    encoder: EncoderSession,
    format: RecordingFormat,
    started_at: Instant,
}

impl ActiveRecording {
    /// Release the device and the analysis graph. Safe to call repeatedly.
    fn release(&mut self) {
        self.stream.stop_tracks();
        self.graph.close();
    }
}

/// The most recent recording, kept reachable through an object URL
struct StoredResult {
    result: RecordingResult,
    url: ObjectUrl,
}

/// Recording session controller
pub struct RecordingController<M, E, V, D, N, A>
where
    M: Microphone,
    E: MediaEncoder,
    V: VisualizerFactory,
    D: Downloader,
    N: Notifier,
    A: AudioCue,
{
    microphone: M,
    encoder: E,
    visualizers: V,
    persistence: PersistenceProtocol<D>,
    notifier: N,
    cues: A,
    blobs: BlobStore,
    config: ControllerConfig,
    callbacks: SessionCallbacks,
    state: SessionState,
    folder: Option<Arc<dyn FolderHandle>>,
    retry: FolderRetryPolicy,
    chunks: ChunkBuffer,
    active: Option<ActiveRecording>,
    visualizer: Option<Box<dyn Visualizer>>,
    last_result: Option<StoredResult>,
}

impl<M, E, V, D, N, A> RecordingController<M, E, V, D, N, A>
where
    M: Microphone,
    E: MediaEncoder,
    V: VisualizerFactory,
    D: Downloader,
    N: Notifier,
    A: AudioCue,
{
    pub fn new(ports: SessionPorts<M, E, V, D, N, A>, blobs: BlobStore, config: ControllerConfig) -> Self {
        let persistence = PersistenceProtocol::new(ports.downloader, blobs.clone(), config.write_timeout);
        Self {
            microphone: ports.microphone,
            encoder: ports.encoder,
            visualizers: ports.visualizers,
            persistence,
            notifier: ports.notifier,
            cues: ports.cues,
            blobs,
            retry: FolderRetryPolicy::new(config.folder_retry_limit),
            config,
            callbacks: SessionCallbacks::default(),
            state: SessionState::new(),
            folder: None,
            chunks: ChunkBuffer::new(),
            active: None,
            visualizer: None,
            last_result: None,
        }
    }

    pub fn with_callbacks(mut self, callbacks: SessionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn folder_name(&self) -> Option<&str> {
        self.folder.as_deref().map(|f| f.name())
    }

    pub fn format(&self) -> Option<RecordingFormat> {
        self.active.as_ref().map(|a| a.format)
    }

    /// Time since the current recording started
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.active.as_ref().map(|a| a.started_at.elapsed())
    }

    /// When the current recording stops on its own, if a max duration is set
    pub fn deadline(&self) -> Option<Instant> {
        let max = self.config.max_duration?;
        self.active.as_ref().map(|a| a.started_at + max.as_std())
    }

    /// Bytes received from the encoder so far
    pub fn buffered_bytes(&self) -> usize {
        self.chunks.total_bytes()
    }

    pub fn last_result(&self) -> Option<&RecordingResult> {
        self.last_result.as_ref().map(|s| &s.result)
    }

    /// Object URL of the most recent recording
    pub fn result_url(&self) -> Option<&ObjectUrl> {
        self.last_result.as_ref().map(|s| &s.url)
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }

    /// Ask the user for a destination folder. A failure keeps the current one.
    pub async fn select_folder(&mut self, picker: &dyn FolderPicker) -> Result<String, SessionError> {
        let after = self.config.permission_timeout;
        let handle = match tokio::time::timeout(after.as_std(), picker.pick()).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => return Err(self.fail(e.into()).await),
            Err(_) => {
                return Err(self
                    .fail(SessionError::Timeout {
                        operation: "Folder selection",
                        after,
                    })
                    .await)
            }
        };

        let name = handle.name().to_string();
        tracing::info!(folder = %name, "Folder selected");
        self.folder = Some(handle);
        self.retry.reset();
        Ok(name)
    }

    /// Start recording into the selected folder.
    pub async fn start(&mut self) -> Result<RecordingFormat, SessionError> {
        if let Err(e) = self.state.begin_request() {
            return Err(self.fail(e.into()).await);
        }
        if self.folder.is_none() {
            self.abort_request();
            return Err(self.fail(SessionError::FolderRequired).await);
        }
        self.emit_status();

        // Probe before touching the device
        let encoder = &self.encoder;
        let format = match RecordingFormat::negotiate(|mime| encoder.is_type_supported(mime)) {
            Some(format) => format,
            None => return Err(self.abort_start(SessionError::NoSupportedFormat).await),
        };

        let after = self.config.permission_timeout;
        let opened = tokio::time::timeout(
            after.as_std(),
            self.microphone.open(self.config.constraints),
        )
        .await;
        let mut stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(self.abort_start(e.into()).await),
            Err(_) => {
                return Err(self
                    .abort_start(SessionError::Timeout {
                        operation: "Microphone access",
                        after,
                    })
                    .await)
            }
        };
        tracing::info!(
            sample_rate = stream.sample_rate(),
            tracks = ?stream.track_labels(),
            "Microphone acquired"
        );

        let mut graph = AudioGraph::connect(&stream, self.config.analyser);
        let options = EncoderOptions {
            format,
            timeslice: self.config.timeslice,
            sample_rate: self.config.sample_rate,
            bitrate: self.config.bitrate,
        };
        let encoder = match self.encoder.start(&stream, options).await {
            Ok(session) => session,
            Err(e) => {
                stream.stop_tracks();
                graph.close();
                return Err(self.abort_start(e.into()).await);
            }
        };

        self.replace_visualizer(graph.analyser());
        self.chunks.clear();
        self.active = Some(ActiveRecording {
            stream,
            graph,
            encoder,
            format,
            started_at: Instant::now(),
        });
        self.state.recording_started()?;
        self.emit_status();

        tracing::info!(format = %format, "Recording started");
        self.notify("Recording started", NotificationIcon::Recording).await;
        self.cue(AudioCueType::RecordingStart).await;
        Ok(format)
    }

    /// Stop recording and persist the result. Does nothing unless recording.
    pub async fn stop(&mut self) -> Result<Option<SaveOutcome>, SessionError> {
        if !self.state.is_recording() {
            tracing::debug!(status = %self.state.status(), "Stop ignored");
            return Ok(None);
        }
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };
        self.state.begin_stop()?;
        self.emit_status();

        // Device and graph go first; the encoder finishes from what it already has
        active.encoder.request_stop();
        active.release();
        self.destroy_visualizer();
        self.cue(AudioCueType::RecordingStop).await;

        self.drain_encoder(&mut active.encoder).await;
        let format = active.format;
        let duration = active.started_at.elapsed();
        drop(active);

        let chunk_count = self.chunks.len();
        let result = RecordingResult::new(self.chunks.assemble(), format, Utc::now());
        tracing::info!(
            chunks = chunk_count,
            size = %result.human_readable_size(),
            duration_ms = duration.as_millis() as u64,
            "Recording finalized"
        );

        let outcome = self.persist(&result).await;
        self.keep_result(result);

        self.state.finish()?;
        self.emit_status();
        Ok(Some(outcome))
    }

    /// Next event from the running encoder; `None` when nothing is recording
    /// or the encoder is gone. Cancel-safe.
    pub async fn next_encoder_event(&mut self) -> Option<EncoderEvent> {
        match self.active.as_mut() {
            Some(active) => active.encoder.next_event().await,
            None => None,
        }
    }

    /// Apply an event received from `next_encoder_event`.
    ///
    /// An encoder error is reported and then ends the session through the
    /// normal stop path, so captured audio is still saved.
    pub async fn handle_encoder_event(
        &mut self,
        event: EncoderEvent,
    ) -> Result<Option<SaveOutcome>, SessionError> {
        match event {
            EncoderEvent::DataAvailable(chunk) => {
                if self.state.is_recording() {
                    self.chunks.append(chunk);
                }
                Ok(None)
            }
            EncoderEvent::Error(e) => {
                self.fail(e.into()).await;
                self.stop().await
            }
            EncoderEvent::Stopped => {
                tracing::warn!("Encoder stopped unexpectedly");
                self.stop().await
            }
        }
    }

    /// Save the most recent recording again, e.g. after picking a new folder
    pub async fn resave(&mut self) -> Result<SaveOutcome, SessionError> {
        if !self.state.is_idle() {
            let err = InvalidStateTransition {
                current_state: self.state.status(),
                action: "save recording".to_string(),
            };
            return Err(self.fail(err.into()).await);
        }
        let Some(result) = self.last_result.as_ref().map(|s| s.result.clone()) else {
            return Err(self.fail(SessionError::NothingToSave).await);
        };
        Ok(self.persist(&result).await)
    }

    /// Teardown for the hosting view. An in-flight recording is stopped and
    /// saved; everything the session holds is released.
    pub async fn shutdown(&mut self) -> Result<Option<SaveOutcome>, SessionError> {
        let outcome = self.stop().await?;
        self.destroy_visualizer();
        self.release_result();
        self.folder = None;
        tracing::debug!("Session shut down");
        Ok(outcome)
    }

    async fn persist(&mut self, result: &RecordingResult) -> SaveOutcome {
        let folder = self.folder.clone();
        let report = self.persistence.save(result, folder.as_deref()).await;

        if let Some(folder) = &folder {
            match &report.folder_error {
                None => self.retry.record_success(),
                Some(_) => {
                    if self.retry.record_failure() {
                        tracing::warn!(
                            folder = folder.name(),
                            failures = self.retry.consecutive_failures(),
                            "Releasing folder after repeated write failures"
                        );
                        self.folder = None;
                        self.retry.reset();
                        if let Some(cb) = &self.callbacks.on_folder_released {
                            cb(folder.name());
                        }
                    }
                }
            }
        }

        match &report.outcome {
            SaveOutcome::Failed(reason) => {
                self.fail(SessionError::Persistence(reason.clone())).await;
            }
            outcome => {
                let icon = match outcome {
                    SaveOutcome::SavedToFolder(_) => NotificationIcon::Success,
                    _ => NotificationIcon::Download,
                };
                self.notify(&outcome.to_string(), icon).await;
                if let Some(cb) = &self.callbacks.on_saved {
                    cb(outcome);
                }
            }
        }
        report.outcome
    }

    async fn drain_encoder(&mut self, encoder: &mut EncoderSession) {
        let after = self.config.write_timeout;
        let chunks = &mut self.chunks;
        let drained = tokio::time::timeout(after.as_std(), async {
            let mut errors = Vec::new();
            while let Some(event) = encoder.next_event().await {
                match event {
                    EncoderEvent::DataAvailable(chunk) => {
                        chunks.append(chunk);
                    }
                    EncoderEvent::Error(e) => errors.push(e),
                    EncoderEvent::Stopped => break,
                }
            }
            errors
        })
        .await;

        match drained {
            Ok(errors) => {
                for e in errors {
                    self.fail(e.into()).await;
                }
            }
            Err(_) => {
                self.fail(SessionError::Timeout {
                    operation: "Encoder finalize",
                    after,
                })
                .await;
            }
        }
    }

    fn keep_result(&mut self, result: RecordingResult) {
        self.release_result();
        let url = self
            .blobs
            .create_object_url(result.shared_data(), result.mime_type());
        self.last_result = Some(StoredResult { result, url });
    }

    fn release_result(&mut self) {
        if let Some(stored) = self.last_result.take() {
            self.blobs.revoke_object_url(&stored.url);
        }
    }

    fn replace_visualizer(&mut self, analyser: Analyser) {
        self.destroy_visualizer();
        let mut visualizer = self.visualizers.create(analyser, self.config.visualizer);
        visualizer.start();
        self.visualizer = Some(visualizer);
    }

    fn destroy_visualizer(&mut self) {
        if let Some(mut visualizer) = self.visualizer.take() {
            visualizer.stop();
            visualizer.destroy();
        }
    }

    /// Requesting -> Idle without having announced Requesting
    fn abort_request(&mut self) {
        if let Err(e) = self.state.request_failed() {
            tracing::warn!(error = %e, "Unexpected state while aborting start");
        }
    }

    async fn abort_start(&mut self, err: SessionError) -> SessionError {
        self.abort_request();
        self.emit_status();
        self.fail(err).await
    }

    fn emit_status(&self) {
        let status = self.state.status();
        tracing::debug!(status = %status, "Session status changed");
        if let Some(cb) = &self.callbacks.on_status {
            cb(status);
        }
    }

    /// Report an error to the user and hand it back
    async fn fail(&self, err: SessionError) -> SessionError {
        tracing::error!(kind = err.kind().as_str(), error = %err, "Session error");
        if let Some(cb) = &self.callbacks.on_error {
            cb(&err);
        }
        self.notify(&err.to_string(), NotificationIcon::Error).await;
        self.cue(AudioCueType::Error).await;
        err
    }

    async fn notify(&self, message: &str, icon: NotificationIcon) {
        if !self.config.enable_notify {
            return;
        }
        if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, message, icon).await {
            tracing::debug!(error = %e, "Notification failed");
        }
    }

    async fn cue(&self, cue: AudioCueType) {
        if !self.config.enable_cues {
            return;
        }
        if let Err(e) = self.cues.play(cue).await {
            tracing::debug!(error = %e, "Audio cue failed");
        }
    }
}

impl<M, E, V, D, N, A> Drop for RecordingController<M, E, V, D, N, A>
where
    M: Microphone,
    E: MediaEncoder,
    V: VisualizerFactory,
    D: Downloader,
    N: Notifier,
    A: AudioCue,
{
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            tracing::warn!("Session dropped while recording; releasing the microphone");
            active.encoder.request_stop();
            active.release();
        }
        self.destroy_visualizer();
        self.release_result();
    }
}
