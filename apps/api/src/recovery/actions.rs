//! Recovery Action Set: the fixed catalog of remediations the orchestrator
//! can run after a failed generation call.
//!
//! Every rotate action is a reload through the client cache; none of them hold
//! client state. On failure the underlying `ConnectorError` is returned as is.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::connectors::{BackendKind, ClientCache, ClientHandle, ClientRequest, ConnectorError, ParamName};

/// Action identity without its arguments. This is what the decision phrase
/// table maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    RotateBackend,
    RotateConfig,
    RotateModel,
    RotateCredential,
    RotateEndpoint,
    DelayRetry,
}

impl ActionKind {
    /// Binds the action to the task it should apply to.
    pub fn for_task(self, task: &str) -> RecoveryAction {
        let task = task.to_string();
        match self {
            ActionKind::RotateBackend => RecoveryAction::RotateBackend { task },
            ActionKind::RotateConfig => RecoveryAction::RotateConfig { task },
            ActionKind::RotateModel => RecoveryAction::RotateModel { task },
            ActionKind::RotateCredential => RecoveryAction::RotateCredential { task },
            ActionKind::RotateEndpoint => RecoveryAction::RotateEndpoint { task },
            ActionKind::DelayRetry => RecoveryAction::DelayRetry { delay: None },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::RotateBackend => "RotateBackend",
            ActionKind::RotateConfig => "RotateConfig",
            ActionKind::RotateModel => "RotateModel",
            ActionKind::RotateCredential => "RotateCredential",
            ActionKind::RotateEndpoint => "RotateEndpoint",
            ActionKind::DelayRetry => "DelayRetry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    RotateBackend { task: String },
    RotateConfig { task: String },
    RotateModel { task: String },
    RotateCredential { task: String },
    RotateEndpoint { task: String },
    /// `None` means the configured default delay.
    DelayRetry { delay: Option<Duration> },
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().name())
    }
}

impl RecoveryAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            RecoveryAction::RotateBackend { .. } => ActionKind::RotateBackend,
            RecoveryAction::RotateConfig { .. } => ActionKind::RotateConfig,
            RecoveryAction::RotateModel { .. } => ActionKind::RotateModel,
            RecoveryAction::RotateCredential { .. } => ActionKind::RotateCredential,
            RecoveryAction::RotateEndpoint { .. } => ActionKind::RotateEndpoint,
            RecoveryAction::DelayRetry { .. } => ActionKind::DelayRetry,
        }
    }

    /// Runs the action. Rotations return the freshly built handle; a delay
    /// returns `None` and leaves the cache untouched.
    pub async fn execute(
        &self,
        cache: &ClientCache,
        default_delay: Duration,
    ) -> Result<Option<Arc<ClientHandle>>, ConnectorError> {
        match self {
            RecoveryAction::RotateBackend { task } => rotate_backend(cache, task).map(Some),
            RecoveryAction::RotateConfig { task } => rotate_params(
                cache,
                task,
                &[ParamName::Endpoint, ParamName::Credential, ParamName::Model],
            )
            .map(Some),
            RecoveryAction::RotateModel { task } => {
                rotate_params(cache, task, &[ParamName::Model]).map(Some)
            }
            RecoveryAction::RotateCredential { task } => {
                rotate_params(cache, task, &[ParamName::Credential]).map(Some)
            }
            RecoveryAction::RotateEndpoint { task } => {
                rotate_params(cache, task, &[ParamName::Endpoint]).map(Some)
            }
            RecoveryAction::DelayRetry { delay } => {
                let delay = delay.unwrap_or(default_delay);
                info!("Retrying operation after {} seconds...", delay.as_secs_f32());
                tokio::time::sleep(delay).await;
                Ok(None)
            }
        }
    }
}

/// Moves a task to the next backend in its precedence list.
pub fn rotate_backend(cache: &ClientCache, task: &str) -> Result<Arc<ClientHandle>, ConnectorError> {
    let current = cache
        .handle(task)
        .map(|h| h.spec.canonical_name.to_string())
        .or_else(|| cache.configured_backend(task));

    let mut precedence = cache.precedence(task);
    if precedence.is_empty() {
        return Err(ConnectorError::PrecedenceExhausted {
            task: task.to_string(),
            removed: None,
        });
    }

    if let Some(current) = &current {
        precedence.retain(|name| !same_backend(name, current));
    }

    let Some(next) = precedence.first() else {
        return Err(ConnectorError::PrecedenceExhausted {
            task: task.to_string(),
            removed: current,
        });
    };

    let next = next.to_lowercase();
    let handle = cache.resolve(task, &ClientRequest::reload_with_backend(next.clone()))?;
    info!("Switched connector for task '{}' to '{}'.", task, next);
    Ok(handle)
}

/// Rebuilds the task's client reading `params` from their alternate keys.
fn rotate_params(
    cache: &ClientCache,
    task: &str,
    params: &[ParamName],
) -> Result<Arc<ClientHandle>, ConnectorError> {
    let handle = cache.resolve(task, &ClientRequest::reload_with_alt(params))?;
    let families: Vec<&str> = params.iter().map(|p| p.family()).collect();
    info!(
        "Switched {} for task '{}' to alternate configuration.",
        families.join("/"),
        task
    );
    Ok(handle)
}

fn same_backend(a: &str, b: &str) -> bool {
    match (BackendKind::parse(a), BackendKind::parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
