use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ensure_exists, parse_reply, prompts, required, ApplicationTask, TaskError};
use crate::llm_client::ServiceClient;
use crate::state::AppState;

/// Tailors a LaTeX resume to a job posting and compiles the result.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeTask {
    /// Path to the `.tex` source of the current resume.
    pub resume_file: PathBuf,
    pub job_role: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
struct LatexReply {
    latex_code: Option<String>,
}

#[async_trait]
impl ApplicationTask for ResumeTask {
    type Output = PathBuf;
    const NAME: &'static str = "resume";

    async fn attempt(
        &self,
        state: &AppState,
        client: Arc<dyn ServiceClient>,
    ) -> Result<PathBuf, TaskError> {
        ensure_exists(&self.resume_file).await?;
        let source = tokio::fs::read_to_string(&self.resume_file).await?;
        if source.trim().is_empty() {
            return Err(TaskError::EmptyInput("resume"));
        }

        let prompt = prompts::resume_prompt(&self.job_role, &self.job_description, &source);
        info!("Sending resume generation prompt to {}", client.backend());
        let raw = client.submit(&prompt).await?;

        let reply: LatexReply = parse_reply(&raw)?;
        let latex = required(reply.latex_code, "latex_code")?;

        let path = state
            .renderer
            .render(&latex, Self::NAME, &state.config.resume_dir)
            .await?;
        info!("Refined resume generated: {}", path.display());
        Ok(path)
    }
}
