// src/engine/mod.rs

//! Build engine for filemill.
//!
//! This module ties together:
//! - the per-file transform pipeline (plugin `transform` chain)
//! - output writing, including source-map emission
//! - the `on_done` hooks run after each file
//! - the one-shot `build` fan-out across all included files

pub mod build;
pub mod pipeline;
pub mod sourcemap;

use std::path::{Path, PathBuf};

pub use build::{build, build_file, build_resolved};
pub use pipeline::{transform_one, TransformOutput};
pub use sourcemap::SourceMap;

/// Outcome of building one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Absolute source path.
    pub filename: PathBuf,
    pub output: BuildOutput,
}

/// Where a build result went. Exactly one shape per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
    /// Written to (or removed from) the output tree at `destname`.
    Written { destname: PathBuf },
    /// No output directory configured; the result stays in memory.
    InMemory { code: String, map: Option<String> },
}

impl BuildResult {
    pub fn written(filename: impl Into<PathBuf>, destname: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            output: BuildOutput::Written {
                destname: destname.into(),
            },
        }
    }

    pub fn in_memory(filename: impl Into<PathBuf>, code: String, map: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            output: BuildOutput::InMemory { code, map },
        }
    }

    pub fn destname(&self) -> Option<&Path> {
        match &self.output {
            BuildOutput::Written { destname } => Some(destname),
            BuildOutput::InMemory { .. } => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.output {
            BuildOutput::InMemory { code, .. } => Some(code),
            BuildOutput::Written { .. } => None,
        }
    }

    pub fn map(&self) -> Option<&str> {
        match &self.output {
            BuildOutput::InMemory { map, .. } => map.as_deref(),
            BuildOutput::Written { .. } => None,
        }
    }
}
