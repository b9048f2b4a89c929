// src/logging.rs

//! Logging setup for `filemill` using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level` if given, else from `FILEMILL_LOG`
//! (`error`, `warn`, `info`, `debug`, `trace` or `1`-`5`), else `info`.
//! Logs go to stderr so `--dry-run` output on stdout stays clean.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "FILEMILL_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {err}"))
}

/// Effective level for a CLI flag and a raw environment value.
///
/// An unparseable environment value falls back to `info`.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    if let Some(level) = cli_level {
        return level.into();
    }
    env_value
        .and_then(|value| value.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}
