use crate::prelude::{println, *};
use colored::Colorize;
use doctree_core::{DocumentTree, HeadingCounts, SectionStats};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Directory, relative to the working directory, that receives JSON output
/// when `--out` is not given.
const DEFAULT_OUTPUT_DIR: &str = "outputs/json";

#[derive(Debug, clap::Args, Clone)]
pub struct ExtractOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Where to write the JSON tree (default: outputs/json/<name>.json)
    #[arg(short, long, env = "DOCTREE_OUT")]
    pub out: Option<PathBuf>,

    /// Also report top-level and total section counts
    #[arg(long)]
    pub stats: bool,
}

/// What a finished extraction reports to the terminal.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub source_file: String,
    pub size_bytes: u64,
    pub blocks: usize,
    pub pages: usize,
    pub counts: HeadingCounts,
    pub output: PathBuf,
    pub elapsed: Duration,
    pub stats: Option<SectionStats>,
}

pub fn run(options: ExtractOptions, global: crate::Global) -> Result<()> {
    let started = Instant::now();
    if global.verbose {
        println!("Processing {}...", options.path.display());
    }

    let doc = crate::document::load(&options.path, &global)?;
    let output = options
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(&options.path));
    write_tree(&doc.analysis.tree, &output)?;

    let metadata = &doc.analysis.tree.metadata;
    let summary = ExtractSummary {
        source_file: metadata.source_file.clone(),
        size_bytes: doc.size_bytes,
        blocks: metadata.total_blocks,
        pages: metadata.total_pages,
        counts: doc.analysis.heading_counts(),
        output,
        elapsed: started.elapsed(),
        stats: options.stats.then(|| SectionStats::of(&doc.analysis.tree)),
    };
    println!("{}", format_summary(&summary));

    Ok(())
}

/// `outputs/json/<stem>.json` for `<dir>/<stem>.pdf`.
pub fn default_output_path(pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    Path::new(DEFAULT_OUTPUT_DIR).join(f!("{stem}.json"))
}

/// Write the tree as pretty JSON, creating parent directories as needed.
pub fn write_tree(tree: &DocumentTree, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| f!("Failed to create output directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(tree)
        .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
    std::fs::write(output, json).wrap_err_with(|| f!("Failed to write {}", output.display()))?;

    log::debug!("wrote outline to {}", output.display());
    Ok(())
}

/// Render the summary block printed after a successful extraction.
pub fn format_summary(summary: &ExtractSummary) -> String {
    let mut result = String::new();
    let label = |name: &str| f!("{:<12}", name).cyan().bold();

    result.push_str(&f!("{}\n", "=".repeat(60).bright_cyan()));
    result.push_str(&f!("{}\n", "OUTLINE EXTRACTED".bright_cyan().bold()));
    result.push_str(&f!("{}\n", "=".repeat(60).bright_cyan()));

    result.push_str(&f!(
        "{} {}\n",
        label("File"),
        summary.source_file.white().bold()
    ));
    result.push_str(&f!(
        "{} {}\n",
        label("Size"),
        f!("{:.1} KB", summary.size_bytes as f64 / 1024.0)
    ));
    result.push_str(&f!("{} {}\n", label("Blocks"), summary.blocks));
    result.push_str(&f!("{} {}\n", label("Pages"), summary.pages));
    result.push_str(&f!(
        "{} {}  {}  {}\n",
        label("Headings"),
        f!("H1: {}", summary.counts.h1).green(),
        f!("H2: {}", summary.counts.h2).yellow(),
        f!("H3: {}", summary.counts.h3).magenta()
    ));
    if let Some(stats) = summary.stats {
        result.push_str(&f!(
            "{} {}\n",
            label("Sections"),
            f!("{} top-level, {} total", stats.top_level, stats.total)
        ));
    }
    result.push_str(&f!(
        "{} {}\n",
        label("Output"),
        summary.output.display().to_string().bright_white()
    ));
    result.push_str(&f!(
        "{} {}",
        label("Elapsed"),
        f!("{:.2}s", summary.elapsed.as_secs_f64()).bright_black()
    ));

    result
}
