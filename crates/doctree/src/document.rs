use crate::prelude::*;
use crate::Global;
use doctree_core::{analyze, Analysis};
use doctree_pdf::{DocumentInfo, LineOptions};
use std::path::Path;

/// A PDF run through extraction and the outline pipeline.
#[derive(Debug)]
pub struct LoadedDocument {
    pub analysis: Analysis,
    pub info: DocumentInfo,
    pub size_bytes: u64,
}

/// Reject paths that are missing or do not carry a `.pdf` extension.
pub fn ensure_pdf_path(path: &Path) -> Result<()> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(Error::NotAPdf(path.display().to_string()).into());
    }
    if !path.is_file() {
        return Err(eyre!("File not found: {}", path.display()));
    }
    Ok(())
}

/// Validate, extract and analyze one PDF.
///
/// `source_file` in the metadata is `path` as passed in, not canonicalized.
/// Document title and author, when the Info dictionary has them, are added
/// to the tree metadata.
pub fn load(path: &Path, global: &Global) -> Result<LoadedDocument> {
    ensure_pdf_path(path)?;
    let config = crate::config::load(global.config.as_deref())?;

    let size_bytes = std::fs::metadata(path)
        .wrap_err_with(|| f!("Failed to stat {}", path.display()))?
        .len();
    let extraction = doctree_pdf::extract_path(path, &LineOptions::default())
        .wrap_err_with(|| f!("Failed to extract text from {}", path.display()))?;
    if extraction.lines.is_empty() {
        return Err(Error::NoText(path.display().to_string()).into());
    }

    let source_file = path.display().to_string();
    let mut analysis = analyze(extraction.lines, &source_file, &config);

    let mut metadata = std::mem::take(&mut analysis.tree.metadata);
    if let Some(title) = &extraction.info.title {
        metadata = metadata.with_field("title", title.clone());
    }
    if let Some(author) = &extraction.info.author {
        metadata = metadata.with_field("author", author.clone());
    }
    analysis.tree.metadata = metadata;

    log::info!(
        "{}: {} lines on {} pages",
        source_file,
        analysis.lines.len(),
        extraction.info.page_count
    );

    Ok(LoadedDocument {
        analysis,
        info: extraction.info,
        size_bytes,
    })
}
