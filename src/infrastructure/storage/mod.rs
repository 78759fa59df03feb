//! Persistence adapters: local destination folders and the downloads fallback

mod downloads;
mod local_folder;

pub use downloads::DownloadsDirDownloader;
pub use local_folder::{LocalFolderHandle, LocalFolderPicker};
