//! Session errors and their user-facing classification

use thiserror::Error;

use crate::application::ports::{CaptureError, EncodingError, FolderError};
use crate::domain::recording::Duration;
use crate::domain::session::InvalidStateTransition;

/// Broad error categories shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Microphone or folder access denied or cancelled
    Permission,
    /// The platform lacks something recording needs
    Capability,
    /// Encoder failure
    Encoding,
    /// Neither folder save nor download worked
    Persistence,
    /// An operation did not complete in time
    Timeout,
    /// Action not allowed right now
    State,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Capability => "capability",
            Self::Encoding => "encoding",
            Self::Persistence => "persistence",
            Self::Timeout => "timeout",
            Self::State => "state",
        }
    }
}

/// Errors from the recording session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please select a destination folder before recording")]
    FolderRequired,

    #[error(transparent)]
    Microphone(#[from] CaptureError),

    #[error(transparent)]
    Folder(#[from] FolderError),

    #[error("No supported audio formats found")]
    NoSupportedFormat,

    #[error("Recording error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Failed to save recording: {0}")]
    Persistence(String),

    #[error("No recording to save")]
    NothingToSave,

    #[error("{operation} timed out after {after}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Microphone(CaptureError::PermissionDenied(_)) => ErrorKind::Permission,
            Self::Microphone(_) => ErrorKind::Capability,
            Self::Folder(FolderError::Unsupported) => ErrorKind::Capability,
            Self::Folder(_) => ErrorKind::Permission,
            Self::NoSupportedFormat => ErrorKind::Capability,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::FolderRequired | Self::NothingToSave | Self::InvalidState(_) => ErrorKind::State,
        }
    }
}
