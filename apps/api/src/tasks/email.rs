use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ensure_exists, parse_reply, prompts, required, ApplicationTask, TaskError};
use crate::llm_client::ServiceClient;
use crate::mail::{Attachment, OutgoingEmail};
use crate::state::AppState;

/// Drafts an application email and sends it with the resume attached.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTask {
    pub resume_path: PathBuf,
    pub position: String,
    pub job_description: String,
    pub company: String,
    pub receiver_email: String,
    #[serde(default)]
    pub attach_cover_letter: bool,
    #[serde(default)]
    pub cover_letter_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct EmailReply {
    email_subject: Option<String>,
    html_code: Option<String>,
}

impl EmailTask {
    fn cover_letter(&self) -> Option<&PathBuf> {
        self.cover_letter_path
            .as_ref()
            .filter(|_| self.attach_cover_letter)
    }
}

#[async_trait]
impl ApplicationTask for EmailTask {
    /// The resume that was sent.
    type Output = PathBuf;
    const NAME: &'static str = "email";

    async fn attempt(
        &self,
        state: &AppState,
        client: Arc<dyn ServiceClient>,
    ) -> Result<PathBuf, TaskError> {
        let mailer = state.mailer.clone().ok_or(TaskError::MailerUnavailable)?;

        ensure_exists(&self.resume_path).await?;
        if let Some(cover_letter) = self.cover_letter() {
            ensure_exists(cover_letter).await?;
        }
        let resume_text = state.extractor.extract_text(&self.resume_path).await?;
        if resume_text.trim().is_empty() {
            return Err(TaskError::EmptyInput("resume"));
        }

        let prompt = prompts::email_prompt(
            &self.position,
            &self.company,
            &self.job_description,
            &resume_text,
        );
        info!("Sending email generation prompt to {}", client.backend());
        let raw = client.submit(&prompt).await?;

        let reply: EmailReply = parse_reply(&raw)?;
        let html_body = required(reply.html_code, "html_code")?;
        let subject = required(reply.email_subject, "email_subject")?;

        let mut attachments = vec![Attachment {
            filename: "Resume.pdf".to_string(),
            path: self.resume_path.clone(),
        }];
        if let Some(cover_letter) = self.cover_letter() {
            attachments.push(Attachment {
                filename: "Cover Letter.pdf".to_string(),
                path: cover_letter.clone(),
            });
        }

        let email = OutgoingEmail {
            to: self.receiver_email.clone(),
            subject,
            html_body,
            attachments,
        };
        let id = mailer.send(&email).await?;
        info!("Email sent successfully to {} (id: {:?})", self.receiver_email, id);
        Ok(self.resume_path.clone())
    }
}
