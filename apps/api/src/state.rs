use std::sync::Arc;

use crate::config::Config;
use crate::connectors::ClientCache;
use crate::documents::{DocumentRenderer, TextExtractor};
use crate::mail::MailSender;
use crate::recovery::RetryOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Task name → active generation client. Shared with the orchestrator.
    pub cache: Arc<ClientCache>,
    pub orchestrator: Arc<RetryOrchestrator>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub extractor: Arc<dyn TextExtractor>,
    /// `None` when no Gmail token is configured; the email task then fails.
    pub mailer: Option<Arc<dyn MailSender>>,
}
