// Connector resolution: which backend serves a task, with which parameters,
// and which constructed client is currently active for it.
//
// registry → factory → cache. Recovery actions (crate::recovery) only ever
// reach clients through `ClientCache::resolve`.

use thiserror::Error;

use crate::llm_client::LlmError;

pub mod cache;
pub mod factory;
pub mod handlers;
pub mod registry;

pub use cache::{ClientCache, ClientHandle, ClientRequest, HandleSummary};
pub use factory::ClientFactory;
pub use registry::{BackendKind, ParamName, Registry, ResolvedConfig};

/// Global fallback order, used when a task has no precedence list of its own.
pub const GLOBAL_PRECEDENCE_KEY: &str = "CONNECTOR_PRECEDENCE";
/// Global default backend, used when a task has no backend of its own.
pub const DEFAULT_CONNECTOR_KEY: &str = "DEFAULT_CONNECTOR";

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Unsupported connector type '{0}'")]
    UnsupportedBackend(String),

    #[error("Missing required configuration for '{backend}': {}", .missing.join(", "))]
    Configuration {
        backend: &'static str,
        missing: Vec<String>,
    },

    #[error("Failed to initialize '{backend}' client: {source}")]
    ClientInit {
        backend: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("{}", precedence_message(.task, .removed.as_deref()))]
    PrecedenceExhausted {
        task: String,
        removed: Option<String>,
    },

    #[error("No connector type configured for task '{0}'")]
    NoBackendConfigured(String),

    #[error("Diagnostic reasoning service is not available")]
    DecisionUnavailable,

    #[error("Diagnostic reasoning call failed: {0}")]
    DecisionFailed(#[source] LlmError),
}

fn precedence_message(task: &str, removed: Option<&str>) -> String {
    match removed {
        Some(current) => format!(
            "No connectors left in precedence list for task '{task}' after removing current connector '{current}'"
        ),
        None => format!("Connector precedence list for task '{task}' is not set or empty"),
    }
}

/// Upper-case, underscore-separated form of a task name used in config keys:
/// `cover letter` → `COVER_LETTER`.
pub fn task_env_prefix(task: &str) -> String {
    task.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Cache identity for a task.
pub fn task_key(task: &str) -> String {
    task.trim().to_lowercase()
}
