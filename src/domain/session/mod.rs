//! Session domain module

mod state;

pub use state::{InvalidStateTransition, SessionState, SessionStatus};
