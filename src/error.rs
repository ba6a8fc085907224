//! Error types for script-runner.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for script-runner service operations.
///
/// Failures of the script itself never show up here: the execution core
/// folds those into an [`ExecutionResult`](crate::execution::ExecutionResult).
#[derive(Error, Debug)]
pub enum RunnerError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The submitted source text could not be written to disk.
    #[error("failed to persist script to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(String),

    /// Invalid execution lifecycle transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::execution::ExecutionState,
        to: crate::execution::ExecutionState,
    },
}

/// Convenience Result type for script-runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
