//! Folder access port: pick a destination folder, write files into it

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Folder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderError {
    #[error("Folder selection cancelled")]
    Cancelled,

    /// Carries the platform's message
    #[error("{0}")]
    PermissionDenied(String),

    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("Failed to write file: {0}")]
    WriteFailed(String),

    #[error("Folder access not supported")]
    Unsupported,
}

/// An open file entry. Data becomes visible under its final name on `close`.
#[async_trait]
pub trait WritableFile: Send {
    async fn write(&mut self, data: &[u8]) -> Result<(), FolderError>;

    /// Commit the file, returning where it now lives
    async fn close(self: Box<Self>) -> Result<PathBuf, FolderError>;
}

/// A granted, writable folder
#[async_trait]
pub trait FolderHandle: Send + Sync + fmt::Debug {
    /// Human-readable folder name
    fn name(&self) -> &str;

    /// Open `file_name` for writing, creating it if absent
    async fn create_writable(&self, file_name: &str) -> Result<Box<dyn WritableFile>, FolderError>;
}

/// Port for obtaining a folder handle from the user
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick(&self) -> Result<Arc<dyn FolderHandle>, FolderError>;
}
