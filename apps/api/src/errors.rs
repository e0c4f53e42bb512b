use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::connectors::ConnectorError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Task failures never reach this type: they are reported as
/// `OperationOutcome` bodies by the task handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Connector(e) => {
                tracing::error!("Connector error: {e}");
                let status = match e {
                    ConnectorError::UnsupportedBackend(_)
                    | ConnectorError::NoBackendConfigured(_)
                    | ConnectorError::Configuration { .. }
                    | ConnectorError::PrecedenceExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    ConnectorError::DecisionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    ConnectorError::ClientInit { .. } | ConnectorError::DecisionFailed(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, "CONNECTOR_ERROR", e.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
