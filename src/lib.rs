//! # script-runner
//!
//! Lightweight HTTP service that saves submitted source text to disk and runs
//! it under a configured interpreter, returning captured output, exit status
//! and a classified failure kind.
//!
//! ## Features
//!
//! - **Bounded runs**: wall-clock timeout with the whole process group killed
//!   and reaped on expiry
//! - **Classified failures**: timeout, not found, permission denied and
//!   unexpected errors are distinguishable in every result
//! - **Injected observation**: the executor reports to an
//!   [`ExecutionObserver`] instead of configuring logging itself
//! - **Async I/O**: concurrent runs on tokio without blocking worker threads
//!
//! Submitted code runs with the privileges of the service process. There is
//! no sandbox; production use needs an external isolation layer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use script_runner::{ExecutionRequest, ScriptExecutor};
//!
//! #[tokio::main]
//! async fn main() {
//!     script_runner::logging::try_init(None).ok();
//!
//!     let executor = ScriptExecutor::new("python3");
//!     let request = ExecutionRequest::new("python3", "hello.py").timeout(Duration::from_secs(5));
//!     let result = executor.run(&request).await;
//!
//!     println!("exit {} succeeded={}", result.exit_code, result.succeeded);
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use error::{Result, RunnerError};
pub use execution::{
    ExecutionFailure, ExecutionObserver, ExecutionRequest, ExecutionResult, FailureKind,
    ScriptExecutor, TracingObserver,
};
pub use storage::{ScriptStore, StoreConfig, StoredScript, SubmissionId};
