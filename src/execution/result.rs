//! Execution result types.

use std::time::Duration;

use super::failure::{ExecutionFailure, FailureKind};

/// Exit code reported when the process produced no normal exit status.
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Result of a script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the failure description.
    pub stderr: String,
    /// Process exit code; [`SENTINEL_EXIT_CODE`] on failure.
    pub exit_code: i32,
    /// True iff the process exited with code 0.
    pub succeeded: bool,
    /// Set when the run could not complete normally.
    pub failure: Option<FailureKind>,
    /// Wall-clock time from launch to result.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Result of a process that exited on its own.
    pub fn completed(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            succeeded: exit_code == 0,
            failure: None,
            duration,
        }
    }

    /// Result of a run that failed; any partial output is dropped.
    pub fn failed(failure: &ExecutionFailure, duration: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: failure.to_string(),
            exit_code: SENTINEL_EXIT_CODE,
            succeeded: false,
            failure: Some(failure.kind()),
            duration,
        }
    }

    /// Whether the process was killed for exceeding its timeout.
    pub fn timed_out(&self) -> bool {
        self.failure == Some(FailureKind::Timeout)
    }
}
