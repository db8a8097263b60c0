//! Core library for doctree
//!
//! This crate implements the **Functional Core** of doctree: it turns an
//! ordered sequence of positioned text lines into a hierarchical outline of
//! H1/H2/H3 sections. Nothing here performs I/O; PDF decoding lives in
//! `doctree_pdf` and files, flags and printing live in the `doctree` binary
//! (the Imperative Shell).
//!
//! # Pipeline
//!
//! ```text
//! TextLine[] --features::enrich--> EnrichedLine[] --classify::classify--> ClassifiedLine[] --tree::build--> DocumentTree
//! ```
//!
//! - [`features`]: page-relative font statistics plus text and position features
//! - [`classify`]: additive heading score, threshold levels, page-1 title promotion
//! - [`tree`]: stack-based nesting of the classified lines
//! - [`render`]: plain-text and Markdown views of a finished tree
//! - [`config`]: the single immutable [`PipelineConfig`] every stage reads from
//!
//! Every stage is total over well-formed input: empty input gives empty
//! output, and missing fonts or empty text fall back to documented defaults.
//!
//! # Example Usage
//!
//! ```rust
//! use doctree_core::{analyze, BBox, PipelineConfig, TextLine};
//!
//! let line = |text: &str, size: f64| TextLine {
//!     text: text.to_string(),
//!     page: 1,
//!     font_size: Some(size),
//!     font_family: "Helvetica".to_string(),
//!     is_bold: false,
//!     is_italic: false,
//!     bbox: BBox::new(50.0, 0.0, 300.0, size),
//! };
//!
//! let lines = vec![
//!     line("Annual Report", 24.0),
//!     line("This year we shipped more than ever before, across every team.", 11.0),
//!     line("Revenue grew in every region and margins held steady overall.", 11.0),
//! ];
//!
//! let analysis = analyze(lines, "report.pdf", &PipelineConfig::default());
//! assert_eq!(analysis.tree.sections[0].title, "Annual Report");
//! assert_eq!(analysis.tree.sections[0].content.len(), 2);
//! ```

pub mod classify;
pub mod config;
pub mod features;
pub mod render;
pub mod tree;
pub mod types;

pub use config::{
    ClassifierConfig, ConfigError, FeatureConfig, PipelineConfig, ScoringWeights, Thresholds,
};
pub use tree::SectionStats;
pub use types::*;

/// Output of [`analyze`]: every classified line plus the outline built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub lines: Vec<ClassifiedLine>,
    pub tree: DocumentTree,
}

/// Number of lines assigned to each level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub body: usize,
}

impl Analysis {
    pub fn heading_counts(&self) -> HeadingCounts {
        let mut counts = HeadingCounts::default();
        for line in &self.lines {
            match line.classification {
                Classification::H1 => counts.h1 += 1,
                Classification::H2 => counts.h2 += 1,
                Classification::H3 => counts.h3 += 1,
                Classification::Body => counts.body += 1,
            }
        }
        counts
    }
}

/// Run enrich, classify and build over one document.
///
/// `total_blocks` is the number of lines and `total_pages` the highest page
/// number seen (0 without lines).
pub fn analyze(lines: Vec<TextLine>, source_file: &str, config: &PipelineConfig) -> Analysis {
    let total_pages = lines.iter().map(|l| l.page).max().unwrap_or(0);
    let enriched = features::enrich(lines, &config.features);
    let classified = classify::classify(enriched, &config.classifier);

    let metadata = DocumentMetadata::new(source_file, classified.len(), total_pages);
    let tree = tree::build(&classified, metadata);

    Analysis {
        lines: classified,
        tree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, page: usize, size: f64, bold: bool) -> TextLine {
        TextLine {
            text: text.to_string(),
            page,
            font_size: Some(size),
            font_family: if bold { "Arial-Bold" } else { "Arial" }.to_string(),
            is_bold: bold,
            is_italic: false,
            bbox: BBox::new(50.0, 0.0, 500.0, size),
        }
    }

    const PARAGRAPH: &str =
        "the quick brown fox jumps over the lazy dog while the band plays on";

    #[test]
    fn test_analyze_empty() {
        let analysis = analyze(Vec::new(), "empty.pdf", &PipelineConfig::default());
        assert!(analysis.lines.is_empty());
        assert!(analysis.tree.sections.is_empty());
        assert_eq!(analysis.tree.metadata.total_blocks, 0);
        assert_eq!(analysis.tree.metadata.total_pages, 0);
        assert_eq!(analysis.heading_counts(), HeadingCounts::default());
    }

    #[test]
    fn test_analyze_builds_outline() {
        let lines = vec![
            line("1. Introduction", 1, 20.0, true),
            line(PARAGRAPH, 1, 10.0, false),
            line(PARAGRAPH, 1, 10.0, false),
            line("1.1 Scope", 1, 12.0, false),
            line(PARAGRAPH, 1, 10.0, false),
            line("2. Methods", 2, 20.0, true),
            line(PARAGRAPH, 2, 10.0, false),
            line(PARAGRAPH, 2, 10.0, false),
        ];
        let analysis = analyze(lines, "paper.pdf", &PipelineConfig::default());

        let meta = &analysis.tree.metadata;
        assert_eq!(meta.source_file, "paper.pdf");
        assert_eq!(meta.total_blocks, 8);
        assert_eq!(meta.total_pages, 2);

        let counts = analysis.heading_counts();
        assert_eq!(counts.h1, 2);
        assert_eq!(counts.h2, 1);
        assert_eq!(counts.h3, 0);
        assert_eq!(counts.body, 5);

        let sections = &analysis.tree.sections;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "1. Introduction");
        assert_eq!(sections[0].content.len(), 2);
        assert_eq!(sections[0].children[0].title, "1.1 Scope");
        assert_eq!(sections[1].title, "2. Methods");
    }
}
