//! Client for custom HTTP generation endpoints.
//!
//! Request: `{"prompt", "model", "temperature"}` POSTed to the configured URL.
//! Response: either OpenAI-style `choices[0].message.content` or `{"response": "..."}`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use super::{build_http_client, chat_completion_text, parse_endpoint, post_json, LlmError, ServiceClient};

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
}

pub struct HttpClient {
    client: Client,
    api_url: Url,
    api_token: String,
    model: Option<String>,
    temperature: f32,
}

impl HttpClient {
    pub fn new(
        api_url: &str,
        api_token: String,
        model: Option<String>,
        temperature: f32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            api_url: parse_endpoint(api_url)?,
            api_token,
            model,
            temperature,
        })
    }
}

fn response_text(value: &Value) -> Option<&str> {
    chat_completion_text(value).or_else(|| {
        value
            .get("response")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    })
}

#[async_trait]
impl ServiceClient for HttpClient {
    async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
        let body = PromptRequest {
            prompt,
            model: self.model.as_deref(),
            temperature: self.temperature,
        };
        let value = post_json(&self.client, self.api_url.as_str(), &self.api_token, &body).await?;

        response_text(&value)
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn backend(&self) -> &'static str {
        "http"
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}
