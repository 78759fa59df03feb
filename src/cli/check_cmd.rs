//! `check` and `devices` subcommands

use std::process::ExitCode;

use crate::application::ports::MediaEncoder;
use crate::domain::compatibility::{check_compatibility, CompatibilityReport};
use crate::domain::config::AppConfig;
use crate::infrastructure::{probe_capabilities, CpalMicrophone, WebmEncoder};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::presenter::Presenter;

/// Build the compatibility report for this machine
pub fn compatibility_report(config: &AppConfig) -> CompatibilityReport {
    let capabilities = probe_capabilities(config.downloads_dir.as_deref());
    let encoder = WebmEncoder::new();
    check_compatibility(capabilities, |mime| encoder.is_type_supported(mime))
}

/// Print the report; exit code 1 when incompatible
pub fn run_check(config: &AppConfig, json: bool, presenter: &Presenter) -> ExitCode {
    let report = compatibility_report(config);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => presenter.output(&text),
            Err(e) => {
                presenter.error(&format!("Failed to encode report: {}", e));
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        presenter.compatibility(&report);
    }

    if report.is_compatible {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

pub fn run_devices(presenter: &Presenter) -> ExitCode {
    match CpalMicrophone::list_input_devices() {
        Ok(devices) => {
            presenter.devices(&devices);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
