//! REST API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::types::{ErrorResponse, SubmitCodeRequest, SubmitCodeResponse};
use crate::execution::ScriptExecutor;
use crate::storage::ScriptStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<ScriptExecutor>,
    pub store: Arc<ScriptStore>,
}

impl AppState {
    pub fn new(executor: ScriptExecutor, store: ScriptStore) -> Self {
        Self {
            executor: Arc::new(executor),
            store: Arc::new(store),
        }
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "script-runner",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "interpreter": state.executor.interpreter().display().to_string(),
        "timeout_secs": state.executor.timeout().as_secs_f64(),
    }))
}

/// Save the submitted code and run it.
///
/// A failure to save is reported as a 500 and nothing runs; every outcome of
/// the run itself, including timeouts and launch failures, is a 200. The
/// script file is removed even if the client goes away mid-run.
pub async fn submit_code(
    State(state): State<AppState>,
    Json(req): Json<SubmitCodeRequest>,
) -> Result<Json<SubmitCodeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let script = state.store.persist(&req.code).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to save user script");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::persist_failed().with_details(e.to_string())),
        )
    })?;

    // Run and cleanup are one task so a dropped request still removes the file.
    let run = tokio::spawn(async move {
        let request = state.executor.request(&script.path).args(req.args);
        let result = state.executor.run(&request).await;
        state.store.discard(&script).await;
        result
    });

    let result = run.await.map_err(|e| {
        tracing::error!(error = %e, "Script run task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::run_aborted().with_details(e.to_string())),
        )
    })?;

    Ok(Json(SubmitCodeResponse::from_result(&result)))
}
