use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ensure_exists, parse_reply, prompts, required, ApplicationTask, TaskError};
use crate::llm_client::ServiceClient;
use crate::state::AppState;

/// Writes a cover letter from the text of an already-tailored resume PDF.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverLetterTask {
    pub refined_resume_path: PathBuf,
    pub job_role: String,
    pub job_description: String,
    pub company: String,
}

#[derive(Debug, Deserialize)]
struct LatexReply {
    latex_code: Option<String>,
}

#[async_trait]
impl ApplicationTask for CoverLetterTask {
    type Output = PathBuf;
    const NAME: &'static str = "cover_letter";

    async fn attempt(
        &self,
        state: &AppState,
        client: Arc<dyn ServiceClient>,
    ) -> Result<PathBuf, TaskError> {
        ensure_exists(&self.refined_resume_path).await?;
        let resume_text = state.extractor.extract_text(&self.refined_resume_path).await?;
        if resume_text.trim().is_empty() {
            return Err(TaskError::EmptyInput("resume"));
        }

        let prompt = prompts::cover_letter_prompt(
            &self.job_role,
            &self.company,
            &self.job_description,
            &resume_text,
        );
        info!("Sending cover letter generation prompt to {}", client.backend());
        let raw = client.submit(&prompt).await?;

        let reply: LatexReply = parse_reply(&raw)?;
        let latex = required(reply.latex_code, "latex_code")?;

        let path = state
            .renderer
            .render(&latex, Self::NAME, &state.config.cover_letter_dir)
            .await?;
        info!("Cover letter generated successfully: {}", path.display());
        Ok(path)
    }
}
