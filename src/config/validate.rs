// src/config/validate.rs

use std::path::Path;

use crate::config::model::ConfigFile;
use crate::errors::{FilemillError, Result};
use crate::paths::normalize_path;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one non-empty `include` entry
/// - an `[engine]` section names a program
/// - `output` is not the project root itself
///
/// It does **not** check that include paths exist; entries matching nothing
/// simply contribute no files.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_include(cfg)?;
    validate_engine(cfg)?;
    validate_output(cfg)?;
    Ok(())
}

fn ensure_has_include(cfg: &ConfigFile) -> Result<()> {
    if cfg.include.is_empty() {
        return Err(FilemillError::ConfigError(
            "config must list at least one `include` entry".to_string(),
        ));
    }
    if cfg.include.iter().any(|entry| entry.trim().is_empty()) {
        return Err(FilemillError::ConfigError(
            "`include` entries must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine(cfg: &ConfigFile) -> Result<()> {
    if let Some(engine) = &cfg.engine {
        let program = engine.command.first().map(|p| p.trim()).unwrap_or_default();
        if program.is_empty() {
            return Err(FilemillError::ConfigError(
                "[engine].command must name a program".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_output(cfg: &ConfigFile) -> Result<()> {
    let Some(output) = &cfg.output else {
        return Ok(());
    };

    // `output` is relative to `root`, so "." (or an absolute path equal to
    // an absolute root) would write next to the sources.
    let normalized = normalize_path(output);
    let is_root = if output.is_absolute() {
        cfg.root.as_deref().map(normalize_path) == Some(normalized)
    } else {
        normalized == Path::new(".")
    };

    if is_root {
        return Err(FilemillError::ConfigError(format!(
            "`output` ({}) must not be the project root",
            output.display()
        )));
    }
    Ok(())
}
