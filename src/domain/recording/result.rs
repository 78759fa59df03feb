//! Recording result value object

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use super::RecordingFormat;

/// Derive the file name for a recording made at `at`.
///
/// `recording-<ISO 8601 timestamp>.webm` with ':' and '.' replaced by '-'
/// so the name is valid on every filesystem.
pub fn suggested_file_name(at: DateTime<Utc>, format: RecordingFormat) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("recording-{}.{}", stamp, format.extension())
}

/// A finished recording ready to be persisted.
#[derive(Debug, Clone)]
pub struct RecordingResult {
    data: Arc<[u8]>,
    format: RecordingFormat,
    suggested_file_name: String,
}

impl RecordingResult {
    pub fn new(data: impl Into<Arc<[u8]>>, format: RecordingFormat, recorded_at: DateTime<Utc>) -> Self {
        Self {
            data: data.into(),
            format,
            suggested_file_name: suggested_file_name(recorded_at, format),
        }
    }

    /// Get the encoded payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the payload
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn format(&self) -> RecordingFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn suggested_file_name(&self) -> &str {
        &self.suggested_file_name
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
