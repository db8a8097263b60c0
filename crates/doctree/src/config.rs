use crate::prelude::*;
use doctree_core::PipelineConfig;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "doctree";
const CONFIG_FILE: &str = "config.toml";

/// `<config_dir>/doctree/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Resolve the pipeline configuration.
///
/// An explicit path (from `--config` or `DOCTREE_CONFIG`) must exist. Without
/// one, the default location is used if present, else built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => read_config(&path),
        _ => {
            log::debug!("no config file found, using built-in defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn read_config(path: &Path) -> Result<PipelineConfig> {
    log::debug!("loading config from {}", path.display());

    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read config file {}", path.display()))?;

    PipelineConfig::from_toml_str(&raw)
        .map_err(|e| Error::Config(f!("{}: {}", path.display(), e)).into())
}
