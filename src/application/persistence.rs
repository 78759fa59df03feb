//! Persistence protocol: folder first, download as the fallback

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::persistence::SaveOutcome;
use crate::domain::recording::{Duration, RecordingResult};

use super::blob_store::BlobStore;
use super::ports::{DownloadError, Downloader, FolderError, FolderHandle};

/// Why a persistence step failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Folder(#[from] FolderError),

    #[error("Folder write timed out after {0}")]
    WriteTimeout(Duration),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Outcome of one save plus the folder failure that caused a fallback, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub outcome: SaveOutcome,
    pub folder_error: Option<PersistenceError>,
}

pub struct PersistenceProtocol<D: Downloader> {
    downloader: D,
    blobs: BlobStore,
    write_timeout: Duration,
}

impl<D: Downloader> PersistenceProtocol<D> {
    pub fn new(downloader: D, blobs: BlobStore, write_timeout: Duration) -> Self {
        Self {
            downloader,
            blobs,
            write_timeout,
        }
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }

    /// Persist `result`, trying `folder` first when present.
    pub async fn save(
        &self,
        result: &RecordingResult,
        folder: Option<&dyn FolderHandle>,
    ) -> SaveReport {
        let mut folder_error = None;

        if let Some(folder) = folder {
            match self.write_to_folder(result, folder).await {
                Ok(path) => {
                    tracing::info!(path = %path.display(), size = result.size_bytes(), "Recording saved to folder");
                    return SaveReport {
                        outcome: SaveOutcome::SavedToFolder(path),
                        folder_error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!(folder = folder.name(), error = %e, "Folder save failed, falling back to download");
                    folder_error = Some(e);
                }
            }
        }

        let outcome = match self.download(result).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Recording downloaded");
                SaveOutcome::Downloaded(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Download fallback failed");
                SaveOutcome::Failed(e.to_string())
            }
        };

        SaveReport {
            outcome,
            folder_error,
        }
    }

    async fn write_to_folder(
        &self,
        result: &RecordingResult,
        folder: &dyn FolderHandle,
    ) -> Result<PathBuf, PersistenceError> {
        let write = async {
            let mut file = folder.create_writable(result.suggested_file_name()).await?;
            file.write(result.data()).await?;
            file.close().await
        };

        match tokio::time::timeout(self.write_timeout.as_std(), write).await {
            Ok(written) => Ok(written?),
            Err(_) => Err(PersistenceError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn download(&self, result: &RecordingResult) -> Result<PathBuf, PersistenceError> {
        let url = self
            .blobs
            .create_object_url(result.shared_data(), result.mime_type());
        let downloaded = self
            .downloader
            .download(&url, result.suggested_file_name())
            .await;
        self.blobs.revoke_object_url(&url);
        Ok(downloaded?)
    }
}
