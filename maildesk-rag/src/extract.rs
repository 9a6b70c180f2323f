//! Text extraction from source documents.
//!
//! One [`TextExtractor`] implementation exists per supported source format.
//! Extraction is synchronous; the expensive work during ingestion is the
//! embedding calls, not the file reads.

use std::path::Path;

use crate::error::{RagError, Result};

/// Extracts the full text of a source document at a filesystem path.
pub trait TextExtractor: Send + Sync {
    /// Extract text content from the file at `path`.
    fn extract(&self, path: &Path) -> Result<String>;
}

fn extraction_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::Extraction { path: path.display().to_string(), message: message.into() }
}

/// A [`TextExtractor`] for PDF files, backed by the `pdf-extract` crate.
///
/// Only available when the `pdf` feature is enabled.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        pdf_extract::extract_text(path).map_err(|e| extraction_error(path, e.to_string()))
    }
}

/// A [`TextExtractor`] for Markdown and plain-text files: reads the file
/// verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| extraction_error(path, e.to_string()))
    }
}
