//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session status as seen by the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Requesting,
    Recording,
    Stopping,
}

impl SessionStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionStatus,
    pub action: String,
}

/// Session state machine.
///
/// ```text
///   IDLE -> REQUESTING        (begin_request)
///   REQUESTING -> RECORDING   (recording_started)
///   REQUESTING -> IDLE        (request_failed)
///   RECORDING -> STOPPING     (begin_stop)
///   STOPPING -> IDLE          (finish)
/// ```
#[derive(Debug, Default)]
pub struct SessionState {
    status: SessionStatus,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_idle(&self) -> bool {
        self.status == SessionStatus::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    fn transition(
        &mut self,
        from: SessionStatus,
        to: SessionStatus,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.status != from {
            return Err(InvalidStateTransition {
                current_state: self.status,
                action: action.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// IDLE -> REQUESTING
    pub fn begin_request(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionStatus::Idle, SessionStatus::Requesting, "start recording")
    }

    /// REQUESTING -> RECORDING
    pub fn recording_started(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionStatus::Requesting,
            SessionStatus::Recording,
            "enter recording",
        )
    }

    /// REQUESTING -> IDLE
    pub fn request_failed(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionStatus::Requesting, SessionStatus::Idle, "abort request")
    }

    /// RECORDING -> STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionStatus::Recording, SessionStatus::Stopping, "stop recording")
    }

    /// STOPPING -> IDLE
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionStatus::Stopping, SessionStatus::Idle, "finish session")
    }
}
