//! Folder Recorder - record the microphone into a chosen folder
//!
//! Audio is captured from an input device, encoded to WebM in timed chunks
//! and saved into a user-selected folder when recording stops. When the
//! folder cannot be written the recording lands in the downloads directory
//! instead.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the session state machine, audio analysis and errors
//! - **Application**: The session controller, the persistence protocol and port traits
//! - **Infrastructure**: Adapter implementations (cpal, WebM, local folders, notifications)
//! - **CLI**: Argument parsing, the interactive session and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
