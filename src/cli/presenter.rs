//! CLI presenter for output formatting

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::compatibility::CompatibilityReport;
use crate::domain::persistence::SaveOutcome;
use crate::domain::session::SessionStatus;
use crate::infrastructure::InputDeviceInfo;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Prompt without newline
    pub fn prompt(&self) {
        eprint!("{} ", ">".dimmed());
        let _ = io::stderr().flush();
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// One line per status change
    pub fn status(&self, status: SessionStatus) {
        let label = match status {
            SessionStatus::Idle => "idle".normal(),
            SessionStatus::Requesting => "requesting microphone".yellow(),
            SessionStatus::Recording => "recording".red().bold(),
            SessionStatus::Stopping => "stopping".yellow(),
        };
        eprintln!("{} {}", "●".cyan(), label);
    }

    pub fn saved(&self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::SavedToFolder(_) => self.success(&outcome.to_string()),
            SaveOutcome::Downloaded(_) => self.warn(&outcome.to_string()),
            SaveOutcome::Failed(_) => self.error(&outcome.to_string()),
        }
    }

    /// `mm:ss`, or `h:mm:ss` past an hour
    pub fn format_elapsed(&self, elapsed_ms: u64) -> String {
        let secs = elapsed_ms / 1000;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{:02}:{:02}", m, s)
        }
    }

    /// Format recording progress bar against a max duration
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: u64) -> String {
        let elapsed_secs = elapsed_ms / 1000;
        let total_secs = total_ms / 1000;
        let percent = if total_ms > 0 {
            (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_secs,
            total_secs
        )
    }

    pub fn compatibility(&self, report: &CompatibilityReport) {
        if report.is_compatible {
            self.success("This system can record and save audio");
            return;
        }
        for issue in &report.issues {
            self.error(issue);
        }
    }

    pub fn devices(&self, devices: &[InputDeviceInfo]) {
        if devices.is_empty() {
            self.warn("No input devices found");
            return;
        }
        for device in devices {
            if device.is_default {
                self.output(&format!("{} {}", device.name, "(default)".dimmed()));
            } else {
                self.output(&device.name);
            }
        }
    }

    pub fn help(&self) {
        let rows = [
            ("r, <enter>", "start or stop recording"),
            ("folder <dir>", "select the destination folder"),
            ("save", "save the last recording again"),
            ("status", "show the session state"),
            ("help", "show this help"),
            ("quit", "stop, save and exit"),
        ];
        for (command, text) in rows {
            eprintln!("  {:<14} {}", command.cyan(), text);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
