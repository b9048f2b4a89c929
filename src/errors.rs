// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilemillError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input and output are the same file: {}", filename.display())]
    SameInputOutput { filename: PathBuf },

    #[error("Transform failed for {}: {message}", filename.display())]
    Transform { filename: PathBuf, message: String },

    #[error("Plugin '{plugin}' failed in `{hook}` hook: {source:#}")]
    Hook {
        plugin: String,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FilemillError>;
