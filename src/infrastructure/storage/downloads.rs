//! Download fallback: copy the blob into the user's downloads directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{DownloadError, Downloader};
use crate::application::{BlobStore, ObjectUrl};

/// Saves blobs into a downloads directory, never overwriting existing files
#[derive(Debug, Clone)]
pub struct DownloadsDirDownloader {
    store: BlobStore,
    dir: Option<PathBuf>,
}

impl DownloadsDirDownloader {
    /// `dir` overrides the platform downloads directory
    pub fn new(store: BlobStore, dir: Option<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.or_else(dirs::download_dir),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

/// `name.ext`, then `name (1).ext`, `name (2).ext`...
fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[async_trait]
impl Downloader for DownloadsDirDownloader {
    async fn download(&self, url: &ObjectUrl, file_name: &str) -> Result<PathBuf, DownloadError> {
        let blob = self
            .store
            .resolve(url)
            .ok_or_else(|| DownloadError::UnknownUrl(url.to_string()))?;
        let dir = self.dir.as_deref().ok_or(DownloadError::NoDownloadsDir)?;

        fs::create_dir_all(dir)
            .await
            .map_err(|e| DownloadError::Failed(format!("{}: {}", dir.display(), e)))?;

        let path = unique_path(dir, file_name);
        fs::write(&path, &blob.data[..])
            .await
            .map_err(|e| DownloadError::Failed(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), bytes = blob.data.len(), "Recording downloaded");
        Ok(path)
    }
}
