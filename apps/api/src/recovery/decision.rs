//! Decision engine. Asks the reasoning service which remediation to apply and
//! validates the reply against a fixed phrase table.
//!
//! The reasoning reply is the only non-deterministic input to recovery. It is
//! treated as an opaque string and never reaches the action set unless it
//! matches a table entry exactly.

use std::sync::Arc;

use tracing::{info, warn};

use super::actions::{ActionKind, RecoveryAction};
use super::prompts::DIAGNOSTIC_PROMPT_TEMPLATE;
use crate::config::ConfigSource;
use crate::connectors::ConnectorError;
use crate::llm_client::{OpenAiClient, ServiceClient};

const DIAGNOSTIC_URL_KEY: &str = "DIAGNOSTIC_TOOL_CON_URL";
const DIAGNOSTIC_MODEL_KEY: &str = "DIAGNOSTIC_TOOL_CON_MODEL";
const DIAGNOSTIC_TOKEN_KEY: &str = "DIAGNOSTIC_TOOL_CON_API_TOKEN";

/// Normalized reply → action.
const PHRASE_TABLE: &[(&str, ActionKind)] = &[
    ("switch connector", ActionKind::RotateBackend),
    ("switch config", ActionKind::RotateConfig),
    ("switch model", ActionKind::RotateModel),
    ("switch token", ActionKind::RotateCredential),
    ("switch url", ActionKind::RotateEndpoint),
    ("retry after delay", ActionKind::DelayRetry),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Action(RecoveryAction),
    /// The normalized reply, which matched no table entry.
    Unrecognized(String),
}

/// Normalizes a reply: trim and lowercase, nothing else.
pub fn normalize_reply(reply: &str) -> String {
    reply.trim().to_lowercase()
}

/// Looks a phrase up in the table. Exact match only.
pub fn action_for_phrase(phrase: &str) -> Option<ActionKind> {
    let normalized = normalize_reply(phrase);
    PHRASE_TABLE
        .iter()
        .find(|(p, _)| *p == normalized)
        .map(|(_, kind)| *kind)
}

pub fn interpret(task: &str, reply: &str) -> Decision {
    let normalized = normalize_reply(reply);
    match action_for_phrase(&normalized) {
        Some(kind) => Decision::Action(kind.for_task(task)),
        None => Decision::Unrecognized(normalized),
    }
}

pub struct DecisionEngine {
    reasoner: Arc<dyn ServiceClient>,
}

impl DecisionEngine {
    pub fn new(reasoner: Arc<dyn ServiceClient>) -> Self {
        Self { reasoner }
    }

    /// Builds the engine on its own OpenAI-compatible client, configured
    /// independently of every task backend.
    pub fn from_config(source: &dyn ConfigSource) -> Result<Self, ConnectorError> {
        let model = source.get(DIAGNOSTIC_MODEL_KEY);
        let token = source.get(DIAGNOSTIC_TOKEN_KEY);

        let (model, token) = match (model, token) {
            (Some(model), Some(token)) => (model, token),
            (model, token) => {
                let mut missing = Vec::new();
                if token.is_none() {
                    missing.push(DIAGNOSTIC_TOKEN_KEY.to_string());
                }
                if model.is_none() {
                    missing.push(DIAGNOSTIC_MODEL_KEY.to_string());
                }
                return Err(ConnectorError::Configuration {
                    backend: "diagnostic",
                    missing,
                });
            }
        };

        let url = source.get(DIAGNOSTIC_URL_KEY);
        let client = OpenAiClient::new(url.as_deref(), token, model, 0.0).map_err(|source| {
            ConnectorError::ClientInit {
                backend: "diagnostic",
                source,
            }
        })?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn prompt(task: &str, error_description: &str) -> String {
        DIAGNOSTIC_PROMPT_TEMPLATE
            .replace("{task}", &task.to_lowercase())
            .replace("{error}", error_description)
    }

    pub async fn decide(
        &self,
        task: &str,
        error_description: &str,
    ) -> Result<Decision, ConnectorError> {
        let prompt = Self::prompt(task, error_description);
        info!(task, "Running diagnostic reasoning call");

        let reply = self
            .reasoner
            .submit(&prompt)
            .await
            .map_err(ConnectorError::DecisionFailed)?;
        info!("Raw diagnostic response: {}", reply);

        let decision = interpret(task, &reply);
        if let Decision::Unrecognized(text) = &decision {
            warn!("No matching recovery action for response: '{}'", text);
        }
        Ok(decision)
    }
}
