//! Download port, the fallback persistence path

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::application::blob_store::ObjectUrl;

/// Download errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("Unknown object URL: {0}")]
    UnknownUrl(String),

    #[error("No downloads directory available")]
    NoDownloadsDir,

    #[error("Download failed: {0}")]
    Failed(String),
}

/// Port for handing a blob to the user as a download
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Save the blob behind `url` as `file_name`, returning where it landed
    async fn download(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError>;
}
