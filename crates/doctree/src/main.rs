use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod document;
mod error;
mod extract;
mod lines;
mod prelude;
mod toc;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Recover the H1/H2/H3 outline of a PDF document from font and layout cues"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Pipeline configuration file (TOML)
    #[clap(long, env = "DOCTREE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "DOCTREE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the outline of a PDF into a JSON file
    Extract(crate::extract::ExtractOptions),

    /// Print the outline of a PDF
    Toc(crate::toc::TocOptions),

    /// Print every line with its heading score and level
    Lines(crate::lines::LinesOptions),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();
    init_logger(app.global.verbose);

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global),
        SubCommands::Toc(options) => crate::toc::run(options, app.global),
        SubCommands::Lines(options) => crate::lines::run(options, app.global),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
