//! Recording session: controller and its errors

mod controller;
mod error;

pub use controller::{ControllerConfig, RecordingController, SessionCallbacks, SessionPorts};
pub use error::{ErrorKind, SessionError};
