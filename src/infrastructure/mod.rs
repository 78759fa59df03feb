//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: cpal capture, WebM
//! encoding, local folders and downloads, terminal visualization,
//! notifications, audio cues and the config file.

pub mod audio_cue;
pub mod capture;
pub mod config;
pub mod notification;
pub mod platform;
pub mod recording;
pub mod storage;
pub mod visualization;

// Re-export adapters
pub use audio_cue::{create_audio_cue, NoOpAudioCue, RodioAudioCue};
pub use capture::{CpalMicrophone, InputDeviceInfo};
pub use config::XdgConfigStore;
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
pub use platform::probe_capabilities;
pub use recording::WebmEncoder;
pub use storage::{DownloadsDirDownloader, LocalFolderHandle, LocalFolderPicker};
pub use visualization::{create_visualizer_factory, NoOpVisualizerFactory, TerminalVisualizerFactory};
