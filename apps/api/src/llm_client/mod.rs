/// LLM clients: every generation backend and the diagnostic reasoning service
/// are reached through the [`ServiceClient`] trait defined here.
///
/// ARCHITECTURAL RULE: task runners never hold a concrete client type. They ask
/// the connector cache for an `Arc<dyn ServiceClient>` per call.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod http;
pub mod huggingface;
pub mod openai;
pub mod prompts;

pub use http::HttpClient;
pub use huggingface::HuggingFaceClient;
pub use openai::OpenAiClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Sampling temperature for task generation calls.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// A constructed connection to one generation backend.
///
/// Implementations own their HTTP client and resolved parameters; they are
/// cheap to share behind an `Arc` and never mutate after construction.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Sends a single user prompt and returns the trimmed completion text.
    async fn submit(&self, prompt: &str) -> Result<String, LlmError>;

    /// Canonical backend family name, e.g. `openai`.
    fn backend(&self) -> &'static str;

    /// Model identifier the client was built with, if any.
    fn model(&self) -> Option<&str>;
}

/// Builds the shared reqwest client used by every backend family.
pub(crate) fn build_http_client() -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Validates an endpoint string at construction time so a malformed URL fails
/// the build instead of the first request.
pub(crate) fn parse_endpoint(raw: &str) -> Result<reqwest::Url, LlmError> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|_| LlmError::InvalidEndpoint(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(LlmError::InvalidEndpoint(raw.to_string())),
    }
}

/// Joins `path` onto a base URL, keeping any path prefix already present
/// (e.g. `https://openrouter.ai/api/v1` + `chat/completions`).
pub(crate) fn join_endpoint(base: &reqwest::Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

/// POSTs a JSON body with bearer auth and returns the decoded JSON response.
/// One request per call; a non-success status becomes `LlmError::Api`.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    token: &str,
    body: &B,
) -> Result<Value, LlmError> {
    let response = client
        .post(url)
        .bearer_auth(token)
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("LLM API returned {}: {}", status, body);
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body),
        });
    }

    let value: Value = response.json().await?;
    debug!("LLM call to {} succeeded", url);
    Ok(value)
}

/// Pulls `error.message` (OpenAI shape) or `error` (string) out of an error
/// body, falling back to the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// Reads `choices[0].message.content` from an OpenAI-style completion body.
pub(crate) fn chat_completion_text(value: &Value) -> Option<&str> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
