//! Platform compatibility check

use serde::Serialize;

use crate::domain::recording::FORMAT_PREFERENCE;

pub const AUDIO_CAPTURE_UNSUPPORTED: &str = "Audio capture not supported";
pub const NO_SUPPORTED_FORMATS: &str = "No supported audio formats found";
pub const FOLDER_ACCESS_UNSUPPORTED: &str = "Folder access not supported";

/// What the host environment offers, gathered by the infrastructure layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// At least one input device is present
    pub audio_capture: bool,
    /// A downloads directory could be resolved for the fallback path
    pub folder_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub is_compatible: bool,
    pub issues: Vec<String>,
}

/// Collect every missing capability. `is_type_supported` is asked about each
/// preferred MIME type; one supported type is enough.
pub fn check_compatibility<F>(
    capabilities: PlatformCapabilities,
    mut is_type_supported: F,
) -> CompatibilityReport
where
    F: FnMut(&str) -> bool,
{
    let mut issues = Vec::new();

    if !capabilities.audio_capture {
        issues.push(AUDIO_CAPTURE_UNSUPPORTED.to_string());
    }

    // Probe every type rather than short-circuiting so the prober sees them all
    let supported = FORMAT_PREFERENCE
        .iter()
        .map(|format| is_type_supported(format.mime_type()))
        .fold(false, |acc, ok| acc || ok);
    if !supported {
        issues.push(NO_SUPPORTED_FORMATS.to_string());
    }

    if !capabilities.folder_access {
        issues.push(FOLDER_ACCESS_UNSUPPORTED.to_string());
    }

    CompatibilityReport {
        is_compatible: issues.is_empty(),
        issues,
    }
}
