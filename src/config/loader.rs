// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "filemill.toml";

/// Read and deserialize a config file without semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;

    toml::from_str(&text).with_context(|| format!("parsing {} as TOML", path.display()))
}

/// [`load_from_path`] followed by [`validate_config`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let config = load_from_path(path)?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}
