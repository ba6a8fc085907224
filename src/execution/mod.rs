//! Script execution engine.
//!
//! This module turns a script path into a bounded, observed, classified
//! process run:
//! - One child process per run, stdout and stderr captured separately
//! - Wall-clock timeout with forced termination of the whole process group
//! - Four-way failure classification folded into the result
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use script_runner::execution::ScriptExecutor;
//!
//! # async fn demo() {
//! let executor = ScriptExecutor::new("python3").with_timeout(Duration::from_secs(10));
//! let request = executor.request("/srv/code/job.py").arg("--verbose");
//! let result = executor.run(&request).await;
//! println!("exit {}: {}", result.exit_code, result.stdout);
//! # }
//! ```

mod executor;
mod failure;
mod observer;
mod request;
mod result;
mod state;

pub use executor::{ScriptExecutor, DEFAULT_INTERPRETER, DEFAULT_MAX_OUTPUT_BYTES};
pub use failure::{ExecutionFailure, FailureKind};
pub use observer::{ExecutionObserver, NoopObserver, TracingObserver};
pub use request::{ExecutionRequest, DEFAULT_TIMEOUT};
pub use result::{ExecutionResult, SENTINEL_EXIT_CODE};
pub use state::ExecutionState;
