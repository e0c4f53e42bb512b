//! Axum route handlers for the Tasks API.
//!
//! Every task request runs to an `OperationOutcome`; recovery has already
//! happened by the time the response is written. Fail outcomes are returned
//! as 422 with the outcome as the body.

use std::path::PathBuf;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::outcome::OperationOutcome;
use crate::state::AppState;
use crate::tasks::{run_task, CoverLetterTask, EmailTask, ResumeTask};

type OutcomeResponse<T> = (StatusCode, Json<OperationOutcome<T>>);

fn outcome_response<T: Serialize>(outcome: OperationOutcome<T>) -> OutcomeResponse<T> {
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(outcome))
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// POST /api/v1/tasks/resume
pub async fn handle_resume(
    State(state): State<AppState>,
    Json(task): Json<ResumeTask>,
) -> Result<OutcomeResponse<PathBuf>, AppError> {
    require_text("job_role", &task.job_role)?;
    require_text("job_description", &task.job_description)?;

    Ok(outcome_response(run_task(state, task, false).await))
}

/// POST /api/v1/tasks/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(task): Json<CoverLetterTask>,
) -> Result<OutcomeResponse<PathBuf>, AppError> {
    require_text("job_role", &task.job_role)?;
    require_text("job_description", &task.job_description)?;
    require_text("company", &task.company)?;

    Ok(outcome_response(run_task(state, task, false).await))
}

/// POST /api/v1/tasks/email
///
/// Sends the application email. The payload of a success outcome is the
/// resume path that was attached.
pub async fn handle_email(
    State(state): State<AppState>,
    Json(task): Json<EmailTask>,
) -> Result<OutcomeResponse<PathBuf>, AppError> {
    require_text("position", &task.position)?;
    require_text("company", &task.company)?;
    if !task.receiver_email.contains('@') {
        return Err(AppError::Validation(format!(
            "receiver_email '{}' is not an email address",
            task.receiver_email
        )));
    }
    if task.attach_cover_letter && task.cover_letter_path.is_none() {
        return Err(AppError::Validation(
            "cover_letter_path is required when attach_cover_letter is set".to_string(),
        ));
    }

    Ok(outcome_response(run_task(state, task, false).await))
}
