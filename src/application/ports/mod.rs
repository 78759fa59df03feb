//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_cue;
pub mod config;
pub mod downloader;
pub mod encoder;
pub mod folder;
pub mod microphone;
pub mod notifier;
pub mod visualizer;

// Re-export common types
pub use audio_cue::{AudioCue, AudioCueError, AudioCueType};
pub use config::ConfigStore;
pub use downloader::{DownloadError, Downloader};
pub use encoder::{EncoderEvent, EncoderOptions, EncoderSession, EncodingError, MediaEncoder};
pub use folder::{FolderError, FolderHandle, FolderPicker, WritableFile};
pub use microphone::{CaptureError, CaptureStream, FrameBus, FrameSink, MediaTrack, Microphone};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use visualizer::{Visualizer, VisualizerFactory, VisualizerOptions};
