use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{ExtractError, TextExtractor};

/// Plain-text extraction with `pdf-extract`. Parsing is CPU-bound, so it runs
/// on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&owned).map_err(|e| ExtractError::Pdf {
                path: owned.clone(),
                message: e.to_string(),
            })
        })
        .await??;

        debug!("Extracted {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}
