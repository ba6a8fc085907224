//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionResult, FailureKind};

/// Request to save and run a piece of code.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCodeRequest {
    /// Source text to run.
    pub code: String,
    /// Arguments passed to the script after its path.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Outcome of a submitted run.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitCodeResponse {
    /// `"success"` when the script exited with code 0, else `"failure"`.
    pub status: String,
    /// Captured standard output.
    pub output: String,
    /// Captured standard error, or the failure description.
    pub error: String,
    /// Process exit code; `-1` when the run did not exit normally.
    pub return_code: i32,
    /// Whether the run was killed for exceeding the timeout.
    pub timeout: bool,
    /// Failure classification; `null` when the process exited on its own.
    pub kind: Option<FailureKind>,
}

impl SubmitCodeResponse {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            status: if result.succeeded { "success" } else { "failure" }.to_string(),
            output: result.stdout.clone(),
            error: result.stderr.clone(),
            return_code: result.exit_code,
            timeout: result.timed_out(),
            kind: result.failure,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "PERSIST_FAILED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The submitted code could not be written to disk; nothing was run.
    pub fn persist_failed() -> Self {
        Self::new("PERSIST_FAILED", "Failed to save the script.")
    }

    /// The task running the script panicked or was cancelled.
    pub fn run_aborted() -> Self {
        Self::new("RUN_ABORTED", "Script run did not finish.")
    }
}
