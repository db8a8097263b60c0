use crate::prelude::{println, *};
use doctree_core::render::{render_indented, render_markdown};
use doctree_core::DocumentTree;
use std::path::PathBuf;

#[derive(Debug, clap::Args, Clone)]
pub struct TocOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Output format: indented, markdown, or json (default: indented)
    #[arg(long, env = "DOCTREE_OUTPUT", default_value = "indented")]
    pub output: OutputFormat,

    /// Output as JSON (alias for --output json)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Section titles, two spaces per level
    Indented,
    /// Headings with their content paragraphs
    Markdown,
    /// The full tree as JSON
    Json,
}

pub fn run(options: TocOptions, global: crate::Global) -> Result<()> {
    let doc = crate::document::load(&options.path, &global)?;

    // --json takes precedence
    let format = if options.json {
        OutputFormat::Json
    } else {
        options.output
    };

    let rendered = format_toc(&doc.analysis.tree, format)?;
    println!("{}", rendered.trim_end());

    Ok(())
}

pub fn format_toc(tree: &DocumentTree, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Indented => Ok(render_indented(tree)),
        OutputFormat::Markdown => Ok(render_markdown(tree)),
        OutputFormat::Json => serde_json::to_string_pretty(tree)
            .map_err(|e| eyre!("JSON serialization failed: {}", e)),
    }
}
