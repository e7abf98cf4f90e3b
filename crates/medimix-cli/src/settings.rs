//! Shared command setup: logging and configuration files.

use anyhow::{Context, Result};
use log::debug;
use medimix_audio::MedimixConfig;
use std::fs;
use std::path::Path;

/// Installs the global logger.
///
/// `RUST_LOG` takes precedence; otherwise the filter is `info`, or `debug`
/// with `verbose`.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    // a logger may already be installed when commands run inside tests
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

/// Loads a configuration file, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<MedimixConfig> {
    let Some(path) = path else {
        return Ok(MedimixConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = MedimixConfig::from_json(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}
