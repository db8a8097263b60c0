use crate::prelude::{println, *};
use colored::Colorize;
use doctree_core::{Classification, ClassifiedLine};
use serde::Serialize;
use std::path::PathBuf;

/// Longest text shown in a table cell before truncation.
const MAX_TEXT_CHARS: usize = 60;

#[derive(Debug, clap::Args, Clone)]
pub struct LinesOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Maximum number of lines to show
    #[arg(short, long, env = "DOCTREE_LIMIT")]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// One classified line as shown by `doctree lines`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRow {
    pub page: usize,
    pub level: Classification,
    pub score: f64,
    pub font_rank: usize,
    pub relative_size: f64,
    pub text: String,
}

impl From<&ClassifiedLine> for LineRow {
    fn from(line: &ClassifiedLine) -> Self {
        LineRow {
            page: line.line.page,
            level: line.classification,
            score: line.heading_score,
            font_rank: line.features.font_rank,
            relative_size: line.features.relative_size,
            text: line.line.text.clone(),
        }
    }
}

pub fn run(options: LinesOptions, global: crate::Global) -> Result<()> {
    let doc = crate::document::load(&options.path, &global)?;
    let rows = collect_rows(&doc.analysis.lines, options.limit);

    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows)
                .map_err(|e| eyre!("JSON serialization failed: {}", e))?
        );
    } else if rows.is_empty() {
        println!("No lines to show.");
    } else {
        build_table(&rows).printstd();
    }

    Ok(())
}

pub fn collect_rows(lines: &[ClassifiedLine], limit: Option<usize>) -> Vec<LineRow> {
    lines
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(LineRow::from)
        .collect()
}

fn build_table(rows: &[LineRow]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Page".bold().cyan(),
        "Level".bold().cyan(),
        "Score".bold().cyan(),
        "Rank".bold().cyan(),
        "Rel. size".bold().cyan(),
        "Text".bold().cyan()
    ]);
    for row in rows {
        let level = match row.level {
            Classification::H1 => row.level.as_str().green().bold(),
            Classification::H2 => row.level.as_str().yellow().bold(),
            Classification::H3 => row.level.as_str().magenta(),
            Classification::Body => row.level.as_str().bright_black(),
        };
        table.add_row(prettytable::row![
            row.page,
            level,
            f!("{:.3}", row.score),
            row.font_rank,
            f!("{:.2}", row.relative_size),
            truncate(&row.text, MAX_TEXT_CHARS)
        ]);
    }
    table
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
