//! Result extension traits used by the orchestration code.
//!
//! `ResultExt::log` records a failure with its source location without
//! consuming it. `TransitionResultExt::discard_illegal` turns a lost
//! transition race into `Ok(None)` so that callers can carry on.

use std::fmt::Display;
use tracing::{debug, error};

use crate::error::{AppError, AppResult};

/// Extension trait for logging errors with context.
pub trait ResultExt<T, E> {
    /// Log the error with context if this is an `Err` variant.
    ///
    /// Returns the original `Result` unchanged.
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller_location = std::panic::Location::caller();
            error!(
                target: "release_coordinator",
                error = %e,
                file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }
}

/// Recovery for transitions that lost a race.
pub trait TransitionResultExt<T> {
    /// Map an `IllegalTransition` error to `Ok(None)`; any other error is
    /// passed through.
    fn discard_illegal(self) -> AppResult<Option<T>>;
}

impl<T> TransitionResultExt<T> for AppResult<T> {
    fn discard_illegal(self) -> AppResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(AppError::IllegalTransition(e)) => {
                debug!(target: "release_coordinator", error = %e, "Discarding superseded transition");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{Lifecycle, TaskState, TaskTransition};

    #[test]
    fn test_result_ext_ok() {
        let result: Result<i32, &str> = Ok(42);
        let logged = result.log("test context");
        assert_eq!(logged.unwrap(), 42);
    }

    #[test]
    fn test_result_ext_err() {
        let result: Result<i32, &str> = Err("test error");
        let logged = result.log("test context");
        assert!(logged.is_err());
    }

    #[test]
    fn test_discard_illegal_swallows_races() {
        let result: AppResult<TaskState> = TaskState::Canceled
            .apply(TaskTransition::Start)
            .map_err(AppError::from);
        assert!(matches!(result.discard_illegal(), Ok(None)));
    }

    #[test]
    fn test_discard_illegal_keeps_other_errors() {
        let result: AppResult<()> = Err(AppError::NotFound("task".into()));
        assert!(matches!(
            result.discard_illegal(),
            Err(AppError::NotFound(_))
        ));

        let ok: AppResult<u8> = Ok(7);
        assert_eq!(ok.discard_illegal().unwrap(), Some(7));
    }
}
