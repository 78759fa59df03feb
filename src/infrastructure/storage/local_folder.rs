//! Local directories as destination folders
//!
//! Files are written to a `.crswap` sibling and renamed into place on close,
//! so a half-written recording never appears under its final name.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{FolderError, FolderHandle, FolderPicker, WritableFile};

const SWAP_SUFFIX: &str = ".crswap";
const PROBE_FILE: &str = ".folder-recorder-probe";

fn map_io(path: &Path, e: io::Error) -> FolderError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => {
            FolderError::PermissionDenied(format!("{}: {}", path.display(), e))
        }
        io::ErrorKind::NotFound => FolderError::NotFound(path.display().to_string()),
        _ => FolderError::WriteFailed(format!("{}: {}", path.display(), e)),
    }
}

/// "Picks" a folder given on the command line or in config
#[derive(Debug, Clone)]
pub struct LocalFolderPicker {
    path: PathBuf,
}

impl LocalFolderPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FolderPicker for LocalFolderPicker {
    async fn pick(&self) -> Result<Arc<dyn FolderHandle>, FolderError> {
        if self.path.as_os_str().is_empty() {
            return Err(FolderError::Cancelled);
        }

        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|e| map_io(&self.path, e))?;
        if !metadata.is_dir() {
            return Err(FolderError::NotFound(format!(
                "{} is not a directory",
                self.path.display()
            )));
        }

        // Write access is only known after trying
        let probe = self.path.join(PROBE_FILE);
        fs::write(&probe, b"")
            .await
            .map_err(|e| map_io(&self.path, e))?;
        if let Err(e) = fs::remove_file(&probe).await {
            tracing::debug!(error = %e, "Failed to remove write probe");
        }

        let handle = LocalFolderHandle::new(&self.path);
        tracing::info!(folder = handle.name(), path = %self.path.display(), "Folder selected");
        Ok(Arc::new(handle))
    }
}

/// A writable local directory
#[derive(Debug, Clone)]
pub struct LocalFolderHandle {
    path: PathBuf,
    name: String,
}

impl LocalFolderHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FolderHandle for LocalFolderHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_writable(&self, file_name: &str) -> Result<Box<dyn WritableFile>, FolderError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(FolderError::WriteFailed(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }

        let final_path = self.path.join(file_name);
        let swap_path = self.path.join(format!("{}{}", file_name, SWAP_SUFFIX));
        let file = fs::File::create(&swap_path)
            .await
            .map_err(|e| map_io(&swap_path, e))?;

        Ok(Box::new(LocalWritableFile {
            file: Some(file),
            swap_path,
            final_path,
            committed: false,
        }))
    }
}

struct LocalWritableFile {
    file: Option<fs::File>,
    swap_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

#[async_trait]
impl WritableFile for LocalWritableFile {
    async fn write(&mut self, data: &[u8]) -> Result<(), FolderError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| FolderError::WriteFailed("file already closed".to_string()))?;
        file.write_all(data)
            .await
            .map_err(|e| map_io(&self.swap_path, e))
    }

    async fn close(mut self: Box<Self>) -> Result<PathBuf, FolderError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(|e| map_io(&self.swap_path, e))?;
            file.sync_all()
                .await
                .map_err(|e| map_io(&self.swap_path, e))?;
        }
        fs::rename(&self.swap_path, &self.final_path)
            .await
            .map_err(|e| map_io(&self.final_path, e))?;
        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for LocalWritableFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = std::fs::remove_file(&self.swap_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pick_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LocalFolderPicker::new(dir.path()).pick().await.unwrap();
        assert_eq!(
            handle.name(),
            dir.path().file_name().unwrap().to_string_lossy()
        );
        assert!(!dir.path().join(PROBE_FILE).exists());
    }

    #[tokio::test]
    async fn pick_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFolderPicker::new(dir.path().join("nope"))
            .pick()
            .await
            .unwrap_err();
        assert!(matches!(err, FolderError::NotFound(_)));
    }

    #[tokio::test]
    async fn pick_regular_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = LocalFolderPicker::new(&file).pick().await.unwrap_err();
        assert!(matches!(err, FolderError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_path_is_cancel() {
        let err = LocalFolderPicker::new("").pick().await.unwrap_err();
        assert_eq!(err, FolderError::Cancelled);
    }

    #[tokio::test]
    async fn write_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LocalFolderHandle::new(dir.path());

        let mut file = handle.create_writable("take.webm").await.unwrap();
        file.write(b"abc").await.unwrap();
        assert!(!dir.path().join("take.webm").exists());
        assert!(dir.path().join("take.webm.crswap").exists());

        let path = file.close().await.unwrap();
        assert_eq!(path, dir.path().join("take.webm"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert!(!dir.path().join("take.webm.crswap").exists());
    }

    #[tokio::test]
    async fn abandoned_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LocalFolderHandle::new(dir.path());

        let mut file = handle.create_writable("take.webm").await.unwrap();
        file.write(b"partial").await.unwrap();
        drop(file);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rejects_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LocalFolderHandle::new(dir.path());
        assert!(handle.create_writable("../escape.webm").await.is_err());
    }
}
