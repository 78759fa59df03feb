//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Folder Recorder - record the microphone straight into a folder
#[derive(Parser, Debug)]
#[command(name = "folder-recorder")]
#[command(version)]
#[command(about = "Record microphone audio as WebM into a chosen folder, with a downloads fallback")]
#[command(long_about = None)]
pub struct Cli {
    /// Destination folder for recordings
    #[arg(short = 'f', long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Where recordings go when the folder cannot be written
    #[arg(long, value_name = "DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Stop automatically after this long (e.g., 30s, 5m, 1h)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Chunk cadence in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeslice: Option<u64>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Play start/stop/error tones
    #[arg(long)]
    pub cues: bool,

    /// Disable the live spectrum
    #[arg(long)]
    pub no_visualizer: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether this machine can record and save
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List audio input devices
    Devices,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "folder",
    "downloads_dir",
    "max_duration",
    "timeslice_ms",
    "sample_rate",
    "bitrate",
    "permission_timeout",
    "write_timeout",
    "folder_retry_limit",
    "notify",
    "audio_cues",
    "visualizer",
    "capture.device",
    "capture.echo_cancellation",
    "capture.noise_suppression",
    "capture.auto_gain_control",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
