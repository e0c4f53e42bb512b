//! Retry orchestrator: the single error handler for failed units of work.
//!
//! Flow per failure:
//!   diagnostic run? → engine present? → decide → execute action → replay once
//!
//! Every exit is an `OperationOutcome`; nothing propagates as an error. The
//! replay closure re-enters the unit of work with the diagnostic flag set, so a
//! second failure stops at the first check instead of being diagnosed again.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::decision::{Decision, DecisionEngine};
use crate::connectors::{ClientCache, ConnectorError};
use crate::models::outcome::OperationOutcome;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Single-use closure that re-runs the failed unit of work in diagnostic mode.
pub type Replay<T> = Box<dyn FnOnce() -> BoxFuture<OperationOutcome<T>> + Send>;

pub struct RetryOrchestrator {
    cache: Arc<ClientCache>,
    engine: Option<Arc<DecisionEngine>>,
    default_delay: Duration,
}

impl RetryOrchestrator {
    pub fn new(
        cache: Arc<ClientCache>,
        engine: Option<Arc<DecisionEngine>>,
        default_delay: Duration,
    ) -> Self {
        Self {
            cache,
            engine,
            default_delay,
        }
    }

    pub fn has_decision_engine(&self) -> bool {
        self.engine.is_some()
    }

    fn engine(&self) -> Result<&DecisionEngine, ConnectorError> {
        self.engine.as_deref().ok_or(ConnectorError::DecisionUnavailable)
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Handles one failure of `task`. `diagnostic` is the failing invocation's
    /// own flag: when set, the failure is reported without any recovery.
    pub async fn recover<T, E>(
        &self,
        error: &E,
        task: &str,
        diagnostic: bool,
        replay: Option<Replay<T>>,
    ) -> OperationOutcome<T>
    where
        E: fmt::Display + ?Sized,
    {
        let error_text = error.to_string();

        if diagnostic {
            warn!(task, "Diagnostic run failed, not attempting further recovery: {}", error_text);
            return OperationOutcome::fail(error_text);
        }

        let engine = match self.engine() {
            Ok(engine) => engine,
            Err(e) => {
                error!(task, "{}, skipping automatic recovery", e);
                return OperationOutcome::fail(error_text);
            }
        };

        let action = match engine.decide(task, &error_text).await {
            Ok(Decision::Action(action)) => action,
            Ok(Decision::Unrecognized(text)) => {
                return OperationOutcome::fail(format!("No diagnostic action found for '{text}'"));
            }
            Err(e) => {
                error!(task, "Diagnostic decision failed: {}", e);
                return OperationOutcome::fail(e.to_string());
            }
        };

        info!(task, action = %action, "Executing recovery action");
        if let Err(e) = action.execute(&self.cache, self.default_delay).await {
            error!(task, action = %action, "Recovery action failed: {}", e);
            return OperationOutcome::fail(e.to_string());
        }

        match replay {
            Some(replay) => {
                info!("Retrying task '{}' after recovery action {}...", task, action);
                replay().await
            }
            None => {
                info!(
                    "Recovery action {} executed successfully (no replay provided).",
                    action
                );
                OperationOutcome::acknowledged(format!("{action} executed"))
            }
        }
    }
}
