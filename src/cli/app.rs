//! Interactive recording session runner

use std::path::PathBuf;
use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::application::ports::{AudioCue, ConfigStore, Notifier, VisualizerFactory};
use crate::application::{
    BlobStore, ControllerConfig, RecordingController, SessionCallbacks, SessionError, SessionPorts,
};
use crate::domain::config::AppConfig;
use crate::domain::persistence::SaveOutcome;
use crate::domain::recording::Duration;
use crate::infrastructure::{
    create_audio_cue, create_notifier, create_visualizer_factory, CpalMicrophone,
    DownloadsDirDownloader, LocalFolderPicker, WebmEncoder, XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

type CliController = RecordingController<
    CpalMicrophone,
    WebmEncoder,
    Box<dyn VisualizerFactory>,
    DownloadsDirDownloader,
    Box<dyn Notifier>,
    Box<dyn AudioCue>,
>;

/// A line typed at the session prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start when idle, stop when recording
    Toggle,
    Folder(PathBuf),
    Save,
    Status,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_lowercase().as_str() {
            "" | "r" | "record" | "stop" => Self::Toggle,
            "folder" | "f" if rest.is_empty() => Self::Invalid("usage: folder <dir>".to_string()),
            "folder" | "f" => Self::Folder(PathBuf::from(rest)),
            "save" | "s" => Self::Save,
            "status" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Invalid(format!("Unknown command '{}', type 'help'", other)),
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "folder_recorder=warn",
        1 => "folder_recorder=debug",
        _ => "folder_recorder=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, path = %store.path().display(), "Ignoring config file");
            Presenter::new().warn(&format!("Ignoring config file: {}", e));
            AppConfig::empty()
        }
    };

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

fn cli_callbacks() -> SessionCallbacks {
    let status = Presenter::new();
    let errors = Presenter::new();
    let released = Presenter::new();
    SessionCallbacks {
        on_status: Some(Box::new(move |s| status.status(s))),
        on_error: Some(Box::new(move |e: &SessionError| errors.error(&e.to_string()))),
        on_saved: None,
        on_folder_released: Some(Box::new(move |name: &str| {
            released.warn(&format!(
                "Stopped using folder '{}' after repeated write failures; select a folder again",
                name
            ))
        })),
    }
}

fn build_controller(config: &AppConfig) -> CliController {
    let blobs = BlobStore::new();
    let ports = SessionPorts {
        microphone: CpalMicrophone::new(config.capture_device().map(str::to_string)),
        encoder: WebmEncoder::new(),
        visualizers: create_visualizer_factory(config.visualizer_or_default()),
        downloader: DownloadsDirDownloader::new(blobs.clone(), config.downloads_dir.clone()),
        notifier: create_notifier(config.notify_or_default()),
        cues: create_audio_cue(config.audio_cues_or_default()),
    };
    RecordingController::new(ports, blobs, ControllerConfig::from_app_config(config))
        .with_callbacks(cli_callbacks())
}

/// Print where a finished recording went; true if it was saved somewhere
fn report_outcome(presenter: &Presenter, outcome: Option<&SaveOutcome>) -> bool {
    match outcome {
        Some(outcome) => {
            presenter.saved(outcome);
            outcome.is_saved()
        }
        None => true,
    }
}

async fn stop_recording(controller: &mut CliController, presenter: &mut Presenter) -> bool {
    presenter.start_spinner("Saving recording...");
    let result = controller.stop().await;
    presenter.stop_spinner();
    match result {
        Ok(outcome) => report_outcome(presenter, outcome.as_ref()),
        // Already reported through on_error
        Err(_) => false,
    }
}

async fn select_folder(controller: &mut CliController, presenter: &Presenter, dir: PathBuf) {
    let picker = LocalFolderPicker::new(dir);
    if let Ok(name) = controller.select_folder(&picker).await {
        presenter.success(&format!("Recording into folder '{}'", name));
    }
}

fn print_status(controller: &CliController, presenter: &Presenter, limit: Option<Duration>) {
    presenter.key_value("status", controller.status().as_str());
    presenter.key_value("folder", controller.folder_name().unwrap_or("(none)"));
    if let Some(format) = controller.format() {
        presenter.key_value("format", format.mime_type());
    }
    if let Some(elapsed) = controller.elapsed() {
        presenter.key_value(
            "elapsed",
            &presenter.format_elapsed(elapsed.as_millis() as u64),
        );
        presenter.key_value("buffered", &format!("{} bytes", controller.buffered_bytes()));
        if let Some(limit) = limit {
            presenter.key_value(
                "progress",
                &presenter.format_progress(elapsed.as_millis() as u64, limit.as_millis()),
            );
        }
    }
    if let Some(result) = controller.last_result() {
        presenter.key_value(
            "last",
            &format!("{} ({})", result.suggested_file_name(), result.human_readable_size()),
        );
    }
}

/// Run the interactive session until quit, end of input or a signal
pub async fn run_session(config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let mut shutdown = match ShutdownSignal::setup() {
        Ok(signal) => signal,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut controller = build_controller(&config);
    if let Some(folder) = config.folder.clone() {
        select_folder(&mut controller, &presenter, folder).await;
    } else {
        presenter.info("No folder selected yet, use 'folder <dir>'");
    }
    presenter.help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_save_ok = true;

    loop {
        let recording = controller.is_recording();
        let deadline = controller.deadline().map(tokio::time::Instant::from_std);
        if !recording {
            presenter.prompt();
        }

        tokio::select! {
            reason = shutdown.recv() => {
                tracing::info!(reason = ?reason, "Shutdown requested");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Command::Toggle if controller.is_recording() => {
                        last_save_ok = stop_recording(&mut controller, &mut presenter).await;
                    }
                    Command::Toggle => {
                        if let Ok(format) = controller.start().await {
                            presenter.info(&format!(
                                "Recording {} - press enter to stop",
                                format.mime_type()
                            ));
                        }
                    }
                    Command::Folder(dir) => select_folder(&mut controller, &presenter, dir).await,
                    Command::Save => {
                        if let Ok(outcome) = controller.resave().await {
                            last_save_ok = report_outcome(&presenter, Some(&outcome));
                        }
                    }
                    Command::Status => print_status(&controller, &presenter, config.max_duration()),
                    Command::Help => presenter.help(),
                    Command::Quit => break,
                    Command::Invalid(message) => presenter.warn(&message),
                },
                Ok(None) => {
                    tracing::debug!("End of input");
                    break;
                }
                Err(e) => {
                    presenter.error(&format!("Failed to read input: {}", e));
                    break;
                }
            },
            event = controller.next_encoder_event(), if recording => {
                let result = match event {
                    Some(event) => controller.handle_encoder_event(event).await,
                    None => controller.stop().await,
                };
                if let Ok(Some(outcome)) = result {
                    last_save_ok = report_outcome(&presenter, Some(&outcome));
                }
            }
            _ = sleep_until(deadline), if deadline.is_some() => {
                presenter.info("Maximum duration reached");
                last_save_ok = stop_recording(&mut controller, &mut presenter).await;
            }
        }
    }

    presenter.start_spinner("Shutting down...");
    let result = controller.shutdown().await;
    presenter.stop_spinner();
    let saved = match result {
        Ok(outcome) => report_outcome(&presenter, outcome.as_ref()),
        Err(_) => false,
    };

    if saved && last_save_ok {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
