//! API layer for script-runner.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/v1` - API information
//! - `POST /submit_code` - Save submitted code and run it (also under `/api/v1`)
//!
//! ## Example
//!
//! ```no_run
//! use script_runner::api::{serve, AppState, ServerConfig};
//! use script_runner::execution::ScriptExecutor;
//! use script_runner::storage::{ScriptStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> script_runner::Result<()> {
//!     let store = ScriptStore::open(StoreConfig::default()).await?;
//!     let state = AppState::new(ScriptExecutor::new("python3"), store);
//!     serve(ServerConfig::new("127.0.0.1", 8000), state).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use router::{create_router, serve, ServerConfig};
pub use types::{ErrorResponse, SubmitCodeRequest, SubmitCodeResponse};
