use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Fail,
}

/// Uniform result of a unit of work and of the recovery loop.
///
/// Fail outcomes always carry `error_message`; the recovery entry point returns
/// this value instead of an error so callers never see a propagating failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome<T> {
    pub status: OutcomeStatus,
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error_message: Option<String>,
}

impl<T> OperationOutcome<T> {
    pub fn success(payload: T) -> Self {
        Self {
            status: OutcomeStatus::Success,
            payload: Some(payload),
            message: None,
            error_message: None,
        }
    }

    /// Success without a payload, e.g. a recovery action run with no replay.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            payload: None,
            message: Some(message.into()),
            error_message: None,
        }
    }

    pub fn fail(error_message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Fail,
            payload: None,
            message: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
