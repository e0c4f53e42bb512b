// Document I/O for the task runners: LaTeX → PDF compilation and PDF → text
// extraction. Both sit behind traits so tasks can be exercised without a TeX
// installation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub mod extract;
pub mod latex;

pub use extract::PdfTextExtractor;
pub use latex::PdfLatexRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("LaTeX code cannot be empty")]
    EmptySource,

    #[error("Failed to launch '{bin}': {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LaTeX compilation failed (exit code {code:?}): {log}")]
    Compilation { code: Option<i32>, log: String },

    #[error("PDF output not found after compilation")]
    MissingOutput,

    #[error("PDF generation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract text from {}: {message}", .path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("Text extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Compiles a complete document source into a PDF inside `output_dir`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Returns the path of the written PDF, named `<name>_<timestamp>.pdf`.
    async fn render(&self, source: &str, name: &str, output_dir: &Path)
        -> Result<PathBuf, RenderError>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}
