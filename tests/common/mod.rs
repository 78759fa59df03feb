//! Mock ports shared by the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use folder_recorder::application::ports::{
    CaptureError, CaptureStream, DownloadError, Downloader, EncoderEvent, EncoderOptions,
    EncoderSession, EncodingError, FolderError, FolderHandle, FolderPicker, FrameBus,
    MediaEncoder, MediaTrack, Microphone, Visualizer, VisualizerFactory, VisualizerOptions,
    WritableFile,
};
use folder_recorder::application::BlobStore;
use folder_recorder::application::ObjectUrl;
use folder_recorder::domain::audio::{Analyser, AudioConstraints};

/// Ordered record of persistence calls across folder and downloader
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------- microphone

pub enum MicBehavior {
    Grant,
    Deny(CaptureError),
    Hang,
}

struct MockTrack {
    stops: Counter,
}

impl MediaTrack for MockTrack {
    fn label(&self) -> &str {
        "mock-mic"
    }

    fn stop(&mut self) {
        self.stops.bump();
    }
}

pub struct MockMicrophone {
    pub behavior: MicBehavior,
    pub opens: Counter,
    pub track_stops: Counter,
}

impl MockMicrophone {
    pub fn new(behavior: MicBehavior) -> Self {
        Self {
            behavior,
            opens: Counter::default(),
            track_stops: Counter::default(),
        }
    }
}

#[async_trait]
impl Microphone for MockMicrophone {
    async fn open(&self, _constraints: AudioConstraints) -> Result<CaptureStream, CaptureError> {
        self.opens.bump();
        match &self.behavior {
            MicBehavior::Grant => Ok(CaptureStream::new(
                48_000,
                FrameBus::new(),
                vec![Box::new(MockTrack {
                    stops: self.track_stops.clone(),
                })],
            )),
            MicBehavior::Deny(e) => Err(e.clone()),
            MicBehavior::Hang => std::future::pending().await,
        }
    }
}

// ------------------------------------------------------------------- encoder

#[derive(Clone)]
pub enum EncoderBehavior {
    /// Deliver this payload as the final chunk once stopped
    Finalize(Vec<u8>),
    /// Final chunk is `take-<n>` for the n-th start
    Numbered,
    /// Report an error right after starting
    FailAfterStart,
    /// Deliver one chunk, then report an error
    FailAfterChunk(Vec<u8>),
    /// `start` itself fails
    InitFails,
}

pub struct MockEncoder {
    pub supported: Vec<&'static str>,
    pub behavior: EncoderBehavior,
    pub starts: Counter,
}

impl MockEncoder {
    pub fn new(behavior: EncoderBehavior) -> Self {
        Self {
            supported: vec!["audio/webm;codecs=opus", "audio/webm"],
            behavior,
            starts: Counter::default(),
        }
    }

    pub fn supporting(mut self, supported: Vec<&'static str>) -> Self {
        self.supported = supported;
        self
    }
}

#[async_trait]
impl MediaEncoder for MockEncoder {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.contains(&mime_type)
    }

    async fn start(
        &self,
        _stream: &CaptureStream,
        _options: EncoderOptions,
    ) -> Result<EncoderSession, EncodingError> {
        let n = self.starts.bump();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (tx, rx) = mpsc::unbounded_channel();

        let payload = match &self.behavior {
            EncoderBehavior::InitFails => {
                return Err(EncodingError::InitFailed("codec unavailable".to_string()))
            }
            EncoderBehavior::FailAfterStart => {
                tx.send(EncoderEvent::Error(EncodingError::Failed(
                    "device lost".to_string(),
                )))
                .unwrap();
                tx.send(EncoderEvent::Stopped).unwrap();
                return Ok(EncoderSession::new(stop_tx, rx));
            }
            EncoderBehavior::FailAfterChunk(chunk) => {
                tx.send(EncoderEvent::DataAvailable(chunk.clone())).unwrap();
                tx.send(EncoderEvent::Error(EncodingError::Failed(
                    "device lost".to_string(),
                )))
                .unwrap();
                tx.send(EncoderEvent::Stopped).unwrap();
                return Ok(EncoderSession::new(stop_tx, rx));
            }
            EncoderBehavior::Finalize(payload) => payload.clone(),
            EncoderBehavior::Numbered => format!("take-{}", n).into_bytes(),
        };

        tokio::spawn(async move {
            let _ = stop_rx.await;
            let _ = tx.send(EncoderEvent::DataAvailable(payload));
            let _ = tx.send(EncoderEvent::Stopped);
        });
        Ok(EncoderSession::new(stop_tx, rx))
    }
}

// ---------------------------------------------------------------- visualizer

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerEvent {
    Created(usize),
    Destroyed(usize),
}

#[derive(Clone, Default)]
pub struct MockVisualizers {
    pub created: Counter,
    pub destroyed: Counter,
    pub events: Arc<Mutex<Vec<VisualizerEvent>>>,
}

impl MockVisualizers {
    pub fn events(&self) -> Vec<VisualizerEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct MockVisualizer {
    id: usize,
    destroyed: Counter,
    events: Arc<Mutex<Vec<VisualizerEvent>>>,
    alive: bool,
}

impl Visualizer for MockVisualizer {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn destroy(&mut self) {
        if self.alive {
            self.alive = false;
            self.destroyed.bump();
            self.events.lock().unwrap().push(VisualizerEvent::Destroyed(self.id));
        }
    }
}

impl VisualizerFactory for MockVisualizers {
    fn create(&self, _analyser: Analyser, _options: VisualizerOptions) -> Box<dyn Visualizer> {
        let id = self.created.bump();
        self.events.lock().unwrap().push(VisualizerEvent::Created(id));
        Box::new(MockVisualizer {
            id,
            destroyed: self.destroyed.clone(),
            events: self.events.clone(),
            alive: true,
        })
    }
}

// -------------------------------------------------------------------- folder

#[derive(Debug, Clone)]
pub enum FolderBehavior {
    Accept,
    Reject(FolderError),
    Hang,
}

#[derive(Debug, Clone)]
pub struct MockFolder {
    pub name: String,
    behavior: Arc<Mutex<FolderBehavior>>,
    pub writes: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    log: CallLog,
}

impl MockFolder {
    pub fn new(name: &str, behavior: FolderBehavior, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            behavior: Arc::new(Mutex::new(behavior)),
            writes: Arc::new(Mutex::new(Vec::new())),
            log,
        }
    }

    pub fn set_behavior(&self, behavior: FolderBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn written(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }
}

struct MockFile {
    path: PathBuf,
    file_name: String,
    data: Vec<u8>,
    writes: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

#[async_trait]
impl WritableFile for MockFile {
    async fn write(&mut self, data: &[u8]) -> Result<(), FolderError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<PathBuf, FolderError> {
        self.writes
            .lock()
            .unwrap()
            .push((self.file_name.clone(), self.data.clone()));
        Ok(self.path)
    }
}

#[async_trait]
impl FolderHandle for MockFolder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_writable(&self, file_name: &str) -> Result<Box<dyn WritableFile>, FolderError> {
        self.log.push(format!("folder:{}", self.name));
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            FolderBehavior::Accept => Ok(Box::new(MockFile {
                path: PathBuf::from("/mock").join(&self.name).join(file_name),
                file_name: file_name.to_string(),
                data: Vec::new(),
                writes: self.writes.clone(),
            })),
            FolderBehavior::Reject(e) => Err(e),
            FolderBehavior::Hang => std::future::pending().await,
        }
    }
}

pub struct MockPicker {
    pub result: Result<MockFolder, FolderError>,
}

#[async_trait]
impl FolderPicker for MockPicker {
    async fn pick(&self) -> Result<Arc<dyn FolderHandle>, FolderError> {
        match &self.result {
            Ok(folder) => Ok(Arc::new(folder.clone())),
            Err(e) => Err(e.clone()),
        }
    }
}

// ---------------------------------------------------------------- downloader

pub struct MockDownloader {
    store: BlobStore,
    log: CallLog,
    pub fail: bool,
    pub downloads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MockDownloader {
    pub fn new(store: BlobStore, log: CallLog) -> Self {
        Self {
            store,
            log,
            fail: false,
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError> {
        self.log.push("download");
        if self.fail {
            return Err(DownloadError::Failed("synthetic clicks are blocked".to_string()));
        }
        let blob = self
            .store
            .resolve(url)
            .ok_or_else(|| DownloadError::UnknownUrl(url.to_string()))?;
        self.downloads
            .lock()
            .unwrap()
            .push((file_name.to_string(), blob.data.to_vec()));
        Ok(PathBuf::from("/home/user/downloads").join(file_name))
    }
}
