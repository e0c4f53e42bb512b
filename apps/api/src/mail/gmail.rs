use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use super::{MailError, MailSender, OutgoingEmail};
use crate::config::Config;
use crate::llm_client::extract_error_message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MIME_LINE_LEN: usize = 76;

/// Sends through the Gmail REST API (`users.messages.send`) with an OAuth
/// access token. The message goes as a base64url-encoded RFC 822 document.
pub struct GmailSender {
    http: Client,
    api_url: String,
    access_token: String,
}

impl GmailSender {
    pub fn new(api_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self, MailError> {
        Ok(Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url: api_url.into(),
            access_token: access_token.into(),
        })
    }

    /// `None` when no access token is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, MailError> {
        config
            .gmail_access_token
            .as_deref()
            .map(|token| Self::new(config.gmail_api_url.clone(), token))
            .transpose()
    }
}

/// One attachment with its contents already loaded.
pub struct LoadedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

fn wrap_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    encoded
        .as_bytes()
        .chunks(MIME_LINE_LEN)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Builds a `multipart/mixed` message: HTML body first, then each attachment
/// as `application/pdf`.
pub fn build_mime(email: &OutgoingEmail, attachments: &[LoadedAttachment], boundary: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("To: {}\r\n", email.to));
    out.push_str(&format!("Subject: {}\r\n", encode_header(&email.subject)));
    out.push_str("MIME-Version: 1.0\r\n");
    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
    ));

    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str("Content-Type: text/html; charset=\"UTF-8\"\r\n");
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrap_base64(email.html_body.as_bytes()));
    out.push_str("\r\n");

    for attachment in attachments {
        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str("Content-Type: application/pdf\r\n");
        out.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{}\"\r\n",
            attachment.filename
        ));
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        out.push_str(&wrap_base64(&attachment.content));
        out.push_str("\r\n");
    }

    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

#[async_trait]
impl MailSender for GmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError> {
        let mut loaded = Vec::with_capacity(email.attachments.len());
        for attachment in &email.attachments {
            let content = tokio::fs::read(&attachment.path)
                .await
                .map_err(|source| MailError::Attachment {
                    path: attachment.path.clone(),
                    source,
                })?;
            loaded.push(LoadedAttachment {
                filename: attachment.filename.clone(),
                content,
            });
        }

        let boundary = format!("genapply-{}", Uuid::new_v4().simple());
        let raw = URL_SAFE.encode(build_mime(email, &loaded, &boundary));

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            error!(
                "Failed to send application email to {}: {} {}",
                email.to, status, message
            );
            return Err(MailError::Rejected {
                to: email.to.clone(),
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await?;
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        info!("Application email sent to {} (id: {:?})", email.to, id);
        Ok(id)
    }
}
