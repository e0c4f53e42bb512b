//! OpenAI-compatible chat completions client (OpenAI, OpenRouter, vLLM, ...).
//! Also used for the diagnostic reasoning service.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use super::{
    build_http_client, chat_completion_text, join_endpoint, parse_endpoint, post_json, LlmError,
    ServiceClient,
};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<&str>,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: parse_endpoint(base_url.unwrap_or(DEFAULT_OPENAI_URL))?,
            api_key,
            model,
            temperature,
        })
    }
}

#[async_trait]
impl ServiceClient for OpenAiClient {
    async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };
        let url = join_endpoint(&self.base_url, "chat/completions");
        let value = post_json(&self.client, &url, &self.api_key, &body).await?;

        chat_completion_text(&value)
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn backend(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}
