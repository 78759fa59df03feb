//! Save outcome value object

use std::fmt;
use std::path::{Path, PathBuf};

/// Result of trying to persist a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written into the user-selected folder
    SavedToFolder(PathBuf),
    /// Delivered through the download fallback
    Downloaded(PathBuf),
    /// Neither path worked
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Where the file ended up, if anywhere
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SavedToFolder(path) | Self::Downloaded(path) => Some(path),
            Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SavedToFolder(path) => write!(f, "Recording saved to {}", path.display()),
            Self::Downloaded(path) => write!(f, "Recording downloaded to {}", path.display()),
            Self::Failed(reason) => write!(f, "Failed to save recording: {}", reason),
        }
    }
}
