//! Check states and their Gerrit wire strings

use std::fmt;

/// Outcome of one dispatch attempt for one checker
///
/// Gerrit only ever sees [`StatusCode::as_str`]. `Running` and `Successful`
/// share `SCHEDULED`: success means the CI pipeline accepted the job, not that
/// the job passed, and the pipeline reports its own verdict later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// No attempt made yet
    #[default]
    Unset,
    /// Dispatch in flight
    Running,
    /// Dispatch failed, or the pipeline rejected the job
    Fail,
    /// Dispatch accepted by the CI pipeline
    Successful,
    /// Checker does not apply to this change
    Irrelevant,
}

impl StatusCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusCode::Unset => "UNSET",
            StatusCode::Running => "SCHEDULED",
            StatusCode::Fail => "FAILED",
            StatusCode::Successful => "SCHEDULED",
            StatusCode::Irrelevant => "NOT_RELEVANT",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            StatusCode::Fail | StatusCode::Successful | StatusCode::Irrelevant
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
