// src/exec/mod.rs

//! Transform engines.
//!
//! The engine is the black-box transpiler the built-in transform plugin
//! hands every source file to. The core never interprets code itself.
//!
//! - [`identity`] returns code unchanged (the default).
//! - [`command`] pipes code through an external process.

pub mod command;
pub mod identity;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Result;

use crate::config::TransformOptions;

pub use command::CommandEngine;
pub use identity::IdentityEngine;

/// Boxed future returned by [`TransformEngine::transform`].
pub type EngineFuture<'a> = Pin<Box<dyn Future<Output = Result<EngineOutput>> + Send + 'a>>;

/// What an engine produced for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub code: String,
    /// Source map as raw JSON, if the engine produced one.
    pub map: Option<String>,
    /// Non-fatal diagnostics, logged by the caller.
    pub warnings: Vec<String>,
}

/// Abstraction over "turn this source into JavaScript".
///
/// Implementations must be cheap to share; one instance serves every file
/// of a session concurrently.
pub trait TransformEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn transform<'a>(
        &'a self,
        code: &'a str,
        filename: &'a Path,
        options: &'a TransformOptions,
    ) -> EngineFuture<'a>;
}
