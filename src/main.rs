//! Folder Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use folder_recorder::cli::{
    app::{init_tracing, load_merged_config, run_session, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    check_cmd::{run_check, run_devices},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use folder_recorder::domain::config::AppConfig;
use folder_recorder::domain::recording::Duration;
use folder_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    init_tracing(cli.verbose);

    // Build CLI config from args
    let cli_config = AppConfig {
        folder: cli.folder.clone(),
        downloads_dir: cli.downloads_dir.clone(),
        max_duration: cli.max_duration.clone(),
        timeslice_ms: cli.timeslice,
        notify: if cli.notify { Some(true) } else { None },
        audio_cues: if cli.cues { Some(true) } else { None },
        visualizer: if cli.no_visualizer { Some(false) } else { None },
        ..Default::default()
    };

    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices) => return run_devices(&presenter),
        Some(Commands::Check { json }) => {
            let config = load_merged_config(cli_config).await;
            return run_check(&config, json, &presenter);
        }
        None => {}
    }

    if cli.timeslice == Some(0) {
        presenter.error("Invalid timeslice: must be greater than zero");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let config = load_merged_config(cli_config).await;

    // Parse max duration up front; the controller only sees valid values
    if let Some(s) = config.max_duration.as_ref() {
        if let Err(e) = s.parse::<Duration>() {
            presenter.error(&format!("Invalid max-duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    run_session(config).await
}
