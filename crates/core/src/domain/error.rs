// Domain Error Types

use thiserror::Error;

/// Misuse of a ping task or of a blocking observer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("task has not been started")]
    NotStarted,

    #[error("task has already been started")]
    AlreadyStarted,

    /// A blocking wait issued from the thread that drives a current-thread runtime
    #[error("cannot block on a current-thread runtime; await the result instead")]
    BlockingOnCurrentThread,
}

/// Failures of a ping run that are not a target-side failure
///
/// An unreachable or unresolvable target is NOT an error: it is a normal
/// `PingResult` with a non-zero exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingError {
    /// The probe executable could not be found or started
    #[error("failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// The caller withdrew interest before or during the run
    #[error("the operation was cancelled")]
    Cancelled,

    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The child exited without an exit code (killed by an outside signal)
    #[error("process terminated abnormally: {0}")]
    Terminated(String),

    #[error("IO error: {0}")]
    Io(String),

    /// The background task running the probe panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl PingError {
    pub fn launch(program: impl Into<String>, reason: impl ToString) -> Self {
        PingError::Launch {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PingError::Cancelled)
    }

    pub fn is_launch_failure(&self) -> bool {
        matches!(self, PingError::Launch { .. })
    }
}
