//! Persistence domain module

mod outcome;
mod retry;

pub use outcome::SaveOutcome;
pub use retry::FolderRetryPolicy;
