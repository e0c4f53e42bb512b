//! Axum route handlers for connector inspection and manual recovery.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::connectors::{ClientRequest, HandleSummary};
use crate::errors::AppError;
use crate::recovery::decision::action_for_phrase;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConnectorsResponse {
    /// Whether failures are diagnosed automatically.
    pub decision_engine: bool,
    pub connectors: Vec<HandleSummary>,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    /// One of the remediation phrases, e.g. `switch model`.
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub task: String,
    pub action: &'static str,
    /// The rebuilt client; absent for a delay.
    pub connector: Option<HandleSummary>,
}

/// URL segments use dashes (`cover-letter`), cache keys use underscores.
fn task_from_path(raw: &str) -> String {
    raw.trim().replace('-', "_")
}

/// GET /api/v1/connectors
pub async fn handle_list_connectors(State(state): State<AppState>) -> Json<ConnectorsResponse> {
    Json(ConnectorsResponse {
        decision_engine: state.orchestrator.has_decision_engine(),
        connectors: state.cache.snapshot(),
    })
}

/// POST /api/v1/connectors/:task/reload
///
/// Rebuilds the task's client from current configuration. On failure the
/// previous client stays active.
pub async fn handle_reload(
    State(state): State<AppState>,
    Path(task): Path<String>,
) -> Result<Json<HandleSummary>, AppError> {
    let task = task_from_path(&task);
    let handle = state.cache.resolve(&task, &ClientRequest::reload())?;
    info!(task = %task, backend = handle.spec.canonical_name, "Connector reloaded on request");
    Ok(Json(handle.summary()))
}

/// DELETE /api/v1/connectors/:task
///
/// Drops the task's cached client; the next call builds a fresh one.
pub async fn handle_invalidate(
    State(state): State<AppState>,
    Path(task): Path<String>,
) -> Result<StatusCode, AppError> {
    let task = task_from_path(&task);
    if state.cache.invalidate(&task) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No cached connector for task '{task}'")))
    }
}

/// DELETE /api/v1/connectors
pub async fn handle_clear(State(state): State<AppState>) -> StatusCode {
    state.cache.clear();
    info!("Connector cache cleared");
    StatusCode::NO_CONTENT
}

/// POST /api/v1/connectors/:task/recover
///
/// Runs one recovery action by hand. The phrase goes through the same table
/// as diagnostic replies.
pub async fn handle_recover(
    State(state): State<AppState>,
    Path(task): Path<String>,
    Json(request): Json<RecoverRequest>,
) -> Result<Json<RecoverResponse>, AppError> {
    let task = task_from_path(&task);
    let kind = action_for_phrase(&request.action).ok_or_else(|| {
        AppError::Validation(format!("Unknown recovery action '{}'", request.action))
    })?;

    let action = kind.for_task(&task);
    info!(task = %task, action = %action, "Manual recovery requested");
    let handle = action
        .execute(&state.cache, state.orchestrator.default_delay())
        .await?;

    Ok(Json(RecoverResponse {
        task,
        action: kind.name(),
        connector: handle.map(|h| h.summary()),
    }))
}
