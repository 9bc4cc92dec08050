// Run outcome: one tagged value per finished run
//
// Every observation style (blocking wait, await, deferred task) presents this
// value; none of them re-derive cancellation on their own.

use super::error::PingError;
use super::ping_result::PingResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Child exited 0
    Replied(PingResult),
    /// Child ran but exited non-zero (unresolvable or unreachable target)
    Unreachable(PingResult),
    /// Aborted by caller request; no result is produced
    Cancelled,
    /// Launch failure or another non-target failure
    Faulted(PingError),
}

impl RunOutcome {
    /// Classify a finished run by its exit code
    pub fn from_result(result: PingResult) -> Self {
        if result.is_success() {
            RunOutcome::Replied(result)
        } else {
            RunOutcome::Unreachable(result)
        }
    }

    pub fn from_error(error: PingError) -> Self {
        match error {
            PingError::Cancelled => RunOutcome::Cancelled,
            other => RunOutcome::Faulted(other),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }

    /// Completed runs (including target failures) are `Ok`
    pub fn into_result(self) -> Result<PingResult, PingError> {
        match self {
            RunOutcome::Replied(result) | RunOutcome::Unreachable(result) => Ok(result),
            RunOutcome::Cancelled => Err(PingError::Cancelled),
            RunOutcome::Faulted(error) => Err(error),
        }
    }
}

impl From<Result<PingResult, PingError>> for RunOutcome {
    fn from(result: Result<PingResult, PingError>) -> Self {
        match result {
            Ok(result) => RunOutcome::from_result(result),
            Err(error) => RunOutcome::from_error(error),
        }
    }
}
