//! Config command handler

use std::path::PathBuf;
use std::str::FromStr;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, CaptureConfig, ENCODER_SAMPLE_RATES};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    match read_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}

/// Parse a number that must be positive, or non-negative when `allow_zero`
fn parse_number<T>(key: &str, value: &str, allow_zero: bool) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| invalid(key, "Value must be a whole number"))?;
    if !allow_zero && parsed == T::default() {
        return Err(invalid(key, "Value must be greater than zero"));
    }
    Ok(parsed)
}

fn parse_duration(key: &str, value: &str) -> Result<String, ConfigError> {
    value
        .parse::<Duration>()
        .map_err(|e| invalid(key, e.to_string()))?;
    Ok(value.trim().to_string())
}

fn parse_path(key: &str, value: &str) -> Result<PathBuf, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(key, "Path must not be empty"));
    }
    Ok(PathBuf::from(value))
}

/// Validate `value` for `key` and store it
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "folder" => config.folder = Some(parse_path(key, value)?),
        "downloads_dir" => config.downloads_dir = Some(parse_path(key, value)?),
        "max_duration" => config.max_duration = Some(parse_duration(key, value)?),
        "permission_timeout" => config.permission_timeout = Some(parse_duration(key, value)?),
        "write_timeout" => config.write_timeout = Some(parse_duration(key, value)?),
        "timeslice_ms" => config.timeslice_ms = Some(parse_number(key, value, false)?),
        "sample_rate" => {
            let rate: u32 = parse_number(key, value, false)?;
            if !ENCODER_SAMPLE_RATES.contains(&rate) {
                return Err(invalid(
                    key,
                    "Sample rate must be one of 8000, 12000, 16000, 24000 or 48000",
                ));
            }
            config.sample_rate = Some(rate);
        }
        "bitrate" => config.bitrate = Some(parse_number(key, value, false)?),
        "folder_retry_limit" => config.folder_retry_limit = Some(parse_number(key, value, true)?),
        "notify" => config.notify = Some(parse_bool(key, value)?),
        "audio_cues" => config.audio_cues = Some(parse_bool(key, value)?),
        "visualizer" => config.visualizer = Some(parse_bool(key, value)?),
        capture_key => {
            let capture = config.capture.get_or_insert_with(CaptureConfig::default);
            match capture_key {
                "capture.device" => capture.device = Some(value.to_string()),
                "capture.echo_cancellation" => {
                    capture.echo_cancellation = Some(parse_bool(key, value)?)
                }
                "capture.noise_suppression" => {
                    capture.noise_suppression = Some(parse_bool(key, value)?)
                }
                "capture.auto_gain_control" => {
                    capture.auto_gain_control = Some(parse_bool(key, value)?)
                }
                _ => return Err(invalid(key, "Unknown key")),
            }
        }
    }
    Ok(())
}

/// Display form of a stored value
fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let capture = config.capture.as_ref();
    match key {
        "folder" => config.folder.as_ref().map(|p| p.display().to_string()),
        "downloads_dir" => config.downloads_dir.as_ref().map(|p| p.display().to_string()),
        "max_duration" => config.max_duration.clone(),
        "timeslice_ms" => config.timeslice_ms.map(|v| v.to_string()),
        "sample_rate" => config.sample_rate.map(|v| v.to_string()),
        "bitrate" => config.bitrate.map(|v| v.to_string()),
        "permission_timeout" => config.permission_timeout.clone(),
        "write_timeout" => config.write_timeout.clone(),
        "folder_retry_limit" => config.folder_retry_limit.map(|v| v.to_string()),
        "notify" => config.notify.map(|b| b.to_string()),
        "audio_cues" => config.audio_cues.map(|b| b.to_string()),
        "visualizer" => config.visualizer.map(|b| b.to_string()),
        "capture.device" => capture.and_then(|c| c.device.clone()),
        "capture.echo_cancellation" => capture.and_then(|c| c.echo_cancellation).map(|b| b.to_string()),
        "capture.noise_suppression" => capture.and_then(|c| c.noise_suppression).map(|b| b.to_string()),
        "capture.auto_gain_control" => capture.and_then(|c| c.auto_gain_control).map(|b| b.to_string()),
        _ => None,
    }
}
