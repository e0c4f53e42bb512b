//! Hugging Face Inference Providers client.
//!
//! Talks to the OpenAI-compatible router. When a provider hint is configured
//! the model is addressed as `<model>:<provider>`, which pins the router to
//! that inference provider.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;

use super::{
    build_http_client, chat_completion_text, join_endpoint, parse_endpoint, post_json, LlmError,
    ServiceClient,
};

pub const DEFAULT_HF_ROUTER_URL: &str = "https://router.huggingface.co/v1";

pub struct HuggingFaceClient {
    client: Client,
    base_url: Url,
    token: String,
    model: String,
    provider: Option<String>,
}

impl HuggingFaceClient {
    pub fn new(
        token: String,
        model: String,
        provider: Option<String>,
        api_url: Option<&str>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: parse_endpoint(api_url.unwrap_or(DEFAULT_HF_ROUTER_URL))?,
            token,
            model,
            provider: provider.filter(|p| !p.eq_ignore_ascii_case("auto")),
        })
    }

    fn routed_model(&self) -> String {
        match &self.provider {
            Some(provider) => format!("{}:{}", self.model, provider),
            None => self.model.clone(),
        }
    }
}

#[async_trait]
impl ServiceClient for HuggingFaceClient {
    async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.routed_model(),
            "messages": [{"role": "user", "content": prompt}],
        });
        let url = join_endpoint(&self.base_url, "chat/completions");
        let value = post_json(&self.client, &url, &self.token, &body).await?;

        chat_completion_text(&value)
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn backend(&self) -> &'static str {
        "huggingface"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}
