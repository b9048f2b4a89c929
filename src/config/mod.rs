// src/config/mod.rs

//! Configuration for filemill.
//!
//! Responsibilities:
//! - The programmatic [`Configuration`] builder callers hand to `build`/`watch`.
//! - Resolution into the immutable [`ResolvedConfig`] (`resolve.rs`).
//! - Engine option handling (`options.rs`).
//! - The TOML-backed file format used by the binary (`model.rs`, `loader.rs`,
//!   `validate.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod resolve;
pub mod validate;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::exec::TransformEngine;
use crate::fs::FileSystem;
use crate::plugin::Plugin;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, EngineSection, WatchSection};
pub use options::{default_transform_options, TransformOptions};
pub use resolve::{resolve_config, Experimental, ResolvedConfig};
pub use validate::validate_config;

/// Default quiet period before a watch event is dispatched.
pub const DEFAULT_CHANGE_THROTTLE: Duration = Duration::from_millis(50);

/// Watch-mode behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Skip the synthetic `add`/`addDir` events for files that already exist
    /// when the watcher starts.
    pub ignore_initial: bool,

    /// Debounce timeout: how long a path must stay quiet before its event is
    /// dispatched. Bursts of writes inside the window collapse into one event.
    pub change_throttle: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            ignore_initial: false,
            change_throttle: DEFAULT_CHANGE_THROTTLE,
        }
    }
}

/// User-supplied configuration. Consumed by [`resolve_config`].
///
/// ```no_run
/// use filemill::config::Configuration;
///
/// let config = Configuration::new(["src"]).output("dist");
/// ```
#[derive(Clone, Default)]
pub struct Configuration {
    /// Project root. Defaults to the current working directory.
    pub root: Option<PathBuf>,

    /// Files, directories or globs, relative to `root`.
    pub include: Vec<String>,

    /// Output directory. `None` keeps build results in memory.
    pub output: Option<PathBuf>,

    pub plugins: Vec<Plugin>,

    pub transform_options: TransformOptions,

    pub watch: WatchOptions,

    /// Replaces the default engine used by the built-in transform plugin.
    pub engine: Option<Arc<dyn TransformEngine>>,

    /// Replaces the real filesystem (tests use an in-memory one).
    pub fs: Option<Arc<dyn FileSystem>>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("root", &self.root)
            .field("include", &self.include)
            .field("output", &self.output)
            .field(
                "plugins",
                &self.plugins.iter().map(Plugin::name).collect::<Vec<_>>(),
            )
            .field("transform_options", &self.transform_options)
            .field("watch", &self.watch)
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .field("fs", &self.fs)
            .finish()
    }
}

impl Configuration {
    pub fn new<I, S>(include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn transform_options(mut self, options: TransformOptions) -> Self {
        self.transform_options = options;
        self
    }

    pub fn watch_options(mut self, watch: WatchOptions) -> Self {
        self.watch = watch;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn TransformEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }
}
