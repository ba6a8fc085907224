//! Observation hooks for script runs.
//!
//! The executor never touches global logging state itself; it reports to an
//! [`ExecutionObserver`] handed to it at construction. [`TracingObserver`]
//! forwards the events to `tracing`.

use super::failure::ExecutionFailure;
use super::request::ExecutionRequest;
use super::result::ExecutionResult;

/// Receives lifecycle events of script runs.
///
/// Each run produces exactly one `launched` followed by either one
/// `completed` or one `failed`. Implementations must not panic; they cannot
/// influence the result.
pub trait ExecutionObserver: Send + Sync {
    /// The run is about to spawn its process.
    fn launched(&self, request: &ExecutionRequest);

    /// The process exited on its own (any exit code).
    fn completed(&self, request: &ExecutionRequest, result: &ExecutionResult);

    /// The run was classified as a failure.
    fn failed(&self, request: &ExecutionRequest, failure: &ExecutionFailure);
}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn launched(&self, request: &ExecutionRequest) {
        tracing::info!(
            script = %request.script.display(),
            interpreter = %request.interpreter.display(),
            timeout_secs = request.timeout.as_secs_f64(),
            "Executing script"
        );
    }

    fn completed(&self, request: &ExecutionRequest, result: &ExecutionResult) {
        tracing::info!(
            script = %request.script.display(),
            exit_code = result.exit_code,
            duration_ms = result.duration.as_millis() as u64,
            "Script finished"
        );
    }

    fn failed(&self, request: &ExecutionRequest, failure: &ExecutionFailure) {
        tracing::error!(
            script = %request.script.display(),
            kind = %failure.kind(),
            reason = %failure,
            "Script execution failed"
        );
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn launched(&self, _request: &ExecutionRequest) {}

    fn completed(&self, _request: &ExecutionRequest, _result: &ExecutionResult) {}

    fn failed(&self, _request: &ExecutionRequest, _failure: &ExecutionFailure) {}
}
