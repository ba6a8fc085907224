//! Failure taxonomy for script runs.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a script could not be run to completion.
///
/// Variants are checked in declaration order: a timeout wins over everything
/// else, then a missing path, then a permission problem, then the catch-all.
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    /// The process did not exit in time and was killed.
    #[error("TimeoutExpired: '{command}' timed out after {} seconds", format_secs(.timeout))]
    Timeout { command: String, timeout: Duration },

    /// Interpreter or script could not be resolved.
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Interpreter or script exists but may not be executed or read.
    #[error("Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other launch or wait failure.
    #[error("Unexpected error: {source}")]
    Unexpected {
        #[source]
        source: io::Error,
    },
}

impl ExecutionFailure {
    /// Classify an I/O error raised while opening or spawning `path`.
    pub fn from_launch_error(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Unexpected { source: err },
        }
    }

    /// The kind of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Self::Unexpected { .. } => FailureKind::Unexpected,
        }
    }
}

/// Whole seconds when exact, otherwise fractional.
fn format_secs(d: &Duration) -> String {
    if d.subsec_nanos() == 0 {
        d.as_secs().to_string()
    } else {
        format!("{:.3}", d.as_secs_f64())
    }
}

/// Discriminant of [`ExecutionFailure`], surfaced to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NotFound,
    PermissionDenied,
    Unexpected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
