//! PDF text-line extraction.
//!
//! Produces the ordered [`TextLine`] sequence consumed by `doctree_core`:
//! one entry per merged horizontal line, sorted by page and then top to
//! bottom, with font size, font family and a top-left-origin bounding box.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use doctree_core::TextLine;
use parser::backend::LopdfSource;

pub mod cleanup;
pub mod parser;

pub use parser::layout::LineOptions;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document-level facts read from the page tree and the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Lines plus document info from a single parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub lines: Vec<TextLine>,
    pub info: DocumentInfo,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse PDF bytes once and return both the lines and the document info.
pub fn extract(bytes: &[u8], options: &LineOptions) -> Result<Extraction, PdfError> {
    let source = LopdfSource::load_bytes(bytes)?;
    let lines = parser::layout::extract_lines(&source, options)?;
    let info = source.info();
    log::debug!(
        "extracted {} lines from {} pages",
        lines.len(),
        info.page_count
    );
    Ok(Extraction { lines, info })
}

/// Read a PDF from disk and [`extract`] it.
pub fn extract_path(path: impl AsRef<Path>, options: &LineOptions) -> Result<Extraction, PdfError> {
    let bytes = std::fs::read(path)?;
    extract(&bytes, options)
}

/// Extract lines with the default [`LineOptions`].
pub fn extract_lines(bytes: &[u8]) -> Result<Vec<TextLine>, PdfError> {
    Ok(extract(bytes, &LineOptions::default())?.lines)
}

/// Page count, title and author without walking any content stream.
pub fn document_info(bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
    Ok(LopdfSource::load_bytes(bytes)?.info())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
