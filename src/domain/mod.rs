//! Domain layer - Core recording logic
//!
//! Value objects, the session state machine, audio analysis and errors.
//! Nothing here touches devices, the filesystem or the terminal.

pub mod audio;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod persistence;
pub mod recording;
pub mod session;

// Re-export common types
pub use audio::{Analyser, AnalyserOptions, AudioConstraints};
pub use compatibility::{check_compatibility, CompatibilityReport, PlatformCapabilities};
pub use config::AppConfig;
pub use error::*;
pub use persistence::{FolderRetryPolicy, SaveOutcome};
pub use recording::{ChunkBuffer, Duration, RecordingFormat, RecordingResult};
pub use session::{InvalidStateTransition, SessionState, SessionStatus};
