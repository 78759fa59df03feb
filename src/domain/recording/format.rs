//! Recording container/codec formats and capability negotiation

use std::fmt;

/// Formats a recording can be produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingFormat {
    /// WebM with an Opus track
    WebmOpus,
    /// WebM with the encoder's default audio codec
    Webm,
}

/// MIME types tried in order when a recording starts. First supported wins.
pub const FORMAT_PREFERENCE: [RecordingFormat; 2] =
    [RecordingFormat::WebmOpus, RecordingFormat::Webm];

impl RecordingFormat {
    /// Get the MIME type string
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::WebmOpus => "audio/webm;codecs=opus",
            Self::Webm => "audio/webm",
        }
    }

    /// File extension used for saved recordings
    pub const fn extension(&self) -> &'static str {
        "webm"
    }

    /// Look up a format by MIME type (whitespace and case tolerant)
    pub fn from_mime(mime: &str) -> Option<Self> {
        let normalized: String = mime
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        FORMAT_PREFERENCE
            .into_iter()
            .find(|f| f.mime_type() == normalized)
    }

    /// Pick the first preferred format the probe accepts.
    ///
    /// The probe is called with each MIME type in preference order and is
    /// not consulted again once a format is accepted.
    pub fn negotiate<F>(mut is_supported: F) -> Option<Self>
    where
        F: FnMut(&str) -> bool,
    {
        FORMAT_PREFERENCE
            .into_iter()
            .find(|f| is_supported(f.mime_type()))
    }
}

impl fmt::Display for RecordingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}
