// Outbound application email.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub mod gmail;

pub use gmail::GmailSender;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Could not read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mail HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not send email to {to} (status {status}): {message}")]
    Rejected {
        to: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Name shown to the recipient.
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends the message, returning the provider's message id when it gives one.
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError>;
}
