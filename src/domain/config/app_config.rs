//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::audio::AudioConstraints;
use crate::domain::recording::Duration;

pub const DEFAULT_TIMESLICE_MS: u64 = 250;
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Input rates the Opus encoder accepts
pub const ENCODER_SAMPLE_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];
pub const DEFAULT_BITRATE: u32 = 128_000;

/// Microphone capture settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub device: Option<String>,
    pub echo_cancellation: Option<bool>,
    pub noise_suppression: Option<bool>,
    pub auto_gain_control: Option<bool>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub folder: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
    pub max_duration: Option<String>,
    pub timeslice_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub bitrate: Option<u32>,
    pub permission_timeout: Option<String>,
    pub write_timeout: Option<String>,
    pub folder_retry_limit: Option<u32>,
    pub notify: Option<bool>,
    pub audio_cues: Option<bool>,
    pub visualizer: Option<bool>,
    pub capture: Option<CaptureConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            folder: None,
            downloads_dir: None,
            max_duration: None,
            timeslice_ms: Some(DEFAULT_TIMESLICE_MS),
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            bitrate: Some(DEFAULT_BITRATE),
            permission_timeout: Some("30s".to_string()),
            write_timeout: Some("30s".to_string()),
            folder_retry_limit: Some(0),
            notify: Some(false),
            audio_cues: Some(false),
            visualizer: Some(true),
            capture: Some(CaptureConfig {
                device: None,
                echo_cancellation: Some(true),
                noise_suppression: Some(true),
                auto_gain_control: Some(true),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            folder: other.folder.or(self.folder),
            downloads_dir: other.downloads_dir.or(self.downloads_dir),
            max_duration: other.max_duration.or(self.max_duration),
            timeslice_ms: other.timeslice_ms.or(self.timeslice_ms),
            sample_rate: other.sample_rate.or(self.sample_rate),
            bitrate: other.bitrate.or(self.bitrate),
            permission_timeout: other.permission_timeout.or(self.permission_timeout),
            write_timeout: other.write_timeout.or(self.write_timeout),
            folder_retry_limit: other.folder_retry_limit.or(self.folder_retry_limit),
            notify: other.notify.or(self.notify),
            audio_cues: other.audio_cues.or(self.audio_cues),
            visualizer: other.visualizer.or(self.visualizer),
            capture: Self::merge_capture_config(self.capture, other.capture),
        }
    }

    fn merge_capture_config(
        base: Option<CaptureConfig>,
        other: Option<CaptureConfig>,
    ) -> Option<CaptureConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(CaptureConfig {
                device: o.device.or(b.device),
                echo_cancellation: o.echo_cancellation.or(b.echo_cancellation),
                noise_suppression: o.noise_suppression.or(b.noise_suppression),
                auto_gain_control: o.auto_gain_control.or(b.auto_gain_control),
            }),
        }
    }

    /// Parsed max_duration; None when unset or invalid
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration.as_ref().and_then(|s| s.parse().ok())
    }

    pub fn timeslice_or_default(&self) -> Duration {
        Duration::from_millis(
            self.timeslice_ms
                .filter(|&ms| ms > 0)
                .unwrap_or(DEFAULT_TIMESLICE_MS),
        )
    }

    pub fn sample_rate_or_default(&self) -> u32 {
        self.sample_rate
            .filter(|&r| r > 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn bitrate_or_default(&self) -> u32 {
        self.bitrate.filter(|&b| b > 0).unwrap_or(DEFAULT_BITRATE)
    }

    /// Get permission_timeout as parsed Duration, or default if not set/invalid
    pub fn permission_timeout_or_default(&self) -> Duration {
        self.permission_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_permission_timeout)
    }

    /// Get write_timeout as parsed Duration, or default if not set/invalid
    pub fn write_timeout_or_default(&self) -> Duration {
        self.write_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_write_timeout)
    }

    pub fn folder_retry_limit_or_default(&self) -> u32 {
        self.folder_retry_limit.unwrap_or(0)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    pub fn audio_cues_or_default(&self) -> bool {
        self.audio_cues.unwrap_or(false)
    }

    pub fn visualizer_or_default(&self) -> bool {
        self.visualizer.unwrap_or(true)
    }

    /// Input device name, if one was configured
    pub fn capture_device(&self) -> Option<&str> {
        self.capture.as_ref().and_then(|c| c.device.as_deref())
    }

    /// Capture constraints; unset flags default to enabled
    pub fn constraints_or_default(&self) -> AudioConstraints {
        let capture = self.capture.clone().unwrap_or_default();
        AudioConstraints {
            echo_cancellation: capture.echo_cancellation.unwrap_or(true),
            noise_suppression: capture.noise_suppression.unwrap_or(true),
            auto_gain_control: capture.auto_gain_control.unwrap_or(true),
        }
    }
}
