//! CLI layer - Command-line interface
//!
//! Argument parsing, the interactive session loop, output formatting
//! and signal handling.

pub mod app;
pub mod args;
pub mod check_cmd;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_session, Command, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
