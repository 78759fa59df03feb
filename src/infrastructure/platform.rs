//! Probe of the host capabilities behind the compatibility report

use std::path::Path;

use crate::domain::compatibility::PlatformCapabilities;

use super::capture::CpalMicrophone;

/// `downloads_dir` is the configured override, if any
pub fn probe_capabilities(downloads_dir: Option<&Path>) -> PlatformCapabilities {
    let folder_access = match downloads_dir {
        Some(_) => true,
        None => dirs::download_dir().is_some(),
    };

    let capabilities = PlatformCapabilities {
        audio_capture: CpalMicrophone::has_input_device(),
        folder_access,
    };
    tracing::debug!(?capabilities, "Probed platform capabilities");
    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires audio hardware"]
    fn configured_downloads_dir_grants_folder_access() {
        let caps = probe_capabilities(Some(Path::new("/tmp")));
        assert!(caps.folder_access);
    }
}
