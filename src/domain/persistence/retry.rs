//! Policy for a folder handle whose writes keep failing

/// How many consecutive failed folder writes are tolerated before the
/// selected folder is dropped and must be picked again.
///
/// A limit of zero keeps the folder forever; every save then tries it
/// first and falls back to a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderRetryPolicy {
    limit: u32,
    consecutive_failures: u32,
}

impl FolderRetryPolicy {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive_failures: 0,
        }
    }

    /// Keep the folder no matter how often writes fail
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a failed write. Returns true when the folder must be reselected.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.limit > 0 && self.consecutive_failures >= self.limit
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}
