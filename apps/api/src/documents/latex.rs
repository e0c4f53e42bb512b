use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::process::Command;
use tracing::{error, info};

use super::{DocumentRenderer, RenderError};

const JOB_NAME: &str = "document";
/// Trailing lines of compiler output kept in a compilation error.
const LOG_TAIL_LINES: usize = 20;

/// Runs `pdflatex` in a scratch directory and moves the result into place.
#[derive(Debug, Clone)]
pub struct PdfLatexRenderer {
    bin: String,
}

impl PdfLatexRenderer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

/// `<name>_<YYYYmmdd_HHMMSS>.pdf`
pub fn output_file_name(name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.pdf", name, at.format("%Y%m%d_%H%M%S"))
}

fn log_tail(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl DocumentRenderer for PdfLatexRenderer {
    async fn render(
        &self,
        source: &str,
        name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        if source.trim().is_empty() {
            error!("Empty LaTeX code received for PDF generation");
            return Err(RenderError::EmptySource);
        }

        tokio::fs::create_dir_all(output_dir).await?;
        // aux/log files stay in the scratch dir and go away with it
        let scratch = tempfile::tempdir()?;
        let tex_path = scratch.path().join(format!("{JOB_NAME}.tex"));
        tokio::fs::write(&tex_path, source).await?;

        let output = Command::new(&self.bin)
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(scratch.path())
            .arg(&tex_path)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            let log = log_tail(&output.stdout);
            error!(
                "LaTeX compilation failed returncode={:?} STDERR={}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
            return Err(RenderError::Compilation {
                code: output.status.code(),
                log,
            });
        }

        let generated = scratch.path().join(format!("{JOB_NAME}.pdf"));
        if !tokio::fs::try_exists(&generated).await? {
            error!("PDF output not found after compilation");
            return Err(RenderError::MissingOutput);
        }

        // copy, not rename: the scratch dir may be on another filesystem
        let target = output_dir.join(output_file_name(name, Local::now()));
        tokio::fs::copy(&generated, &target).await?;
        info!("PDF created successfully: {}", target.display());
        Ok(target)
    }
}
