// src/config/model.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::config::options::TransformOptions;
use crate::config::{Configuration, WatchOptions};
use crate::exec::CommandEngine;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// root = "."
/// include = ["src"]
/// output = "dist"
///
/// [transform_options]
/// sourceMaps = true
///
/// [engine]
/// command = ["esbuild", "--loader=ts", "--format=cjs"]
///
/// [watch]
/// ignore_initial = false
/// change_throttle_ms = 50
/// ```
///
/// Everything except `include` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Project root, relative to the config file's directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Files, directories or globs, relative to `root`.
    #[serde(default)]
    pub include: Vec<String>,

    /// Output directory, relative to `root`. Omit to build in memory only.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Passed through to the engine unchanged.
    #[serde(default)]
    pub transform_options: TransformOptions,

    /// External engine; the identity engine is used when absent.
    #[serde(default)]
    pub engine: Option<EngineSection>,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Program and arguments. `{filename}` is replaced with the source path.
    pub command: Vec<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default)]
    pub ignore_initial: bool,

    /// Debounce timeout for watch events, in milliseconds.
    #[serde(default = "default_change_throttle_ms")]
    pub change_throttle_ms: u64,
}

fn default_change_throttle_ms() -> u64 {
    50
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            ignore_initial: false,
            change_throttle_ms: default_change_throttle_ms(),
        }
    }
}

impl From<&WatchSection> for WatchOptions {
    fn from(section: &WatchSection) -> Self {
        WatchOptions {
            ignore_initial: section.ignore_initial,
            change_throttle: Duration::from_millis(section.change_throttle_ms),
        }
    }
}

impl ConfigFile {
    /// Turn the file into a [`Configuration`].
    ///
    /// `base_dir` is the directory containing the config file; `root` is
    /// resolved against it (and defaults to it).
    pub fn into_configuration(self, base_dir: &Path) -> Result<Configuration> {
        let root = match self.root {
            Some(root) if root.is_absolute() => root,
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };

        let mut config = Configuration::new(self.include)
            .root(root)
            .transform_options(self.transform_options)
            .watch_options(WatchOptions::from(&self.watch));

        if let Some(output) = self.output {
            config = config.output(output);
        }

        if let Some(engine) = self.engine {
            config = config.engine(Arc::new(CommandEngine::new(engine.command)?));
        }

        Ok(config)
    }
}
