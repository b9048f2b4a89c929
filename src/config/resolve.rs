// src/config/resolve.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::options::{default_transform_options, TransformOptions};
use crate::config::{Configuration, WatchOptions};
use crate::errors::Result;
use crate::exec::{IdentityEngine, TransformEngine};
use crate::fs::{FileSystem, RealFileSystem};
use crate::paths::{
    self, absolutize, extension_of, normalize_path, slash, JS_EXTENSIONS, STATIC_EXTENSIONS,
};
use crate::plugin::{builtin, hook_error, Plugin};

/// Fully-resolved configuration for one `build`/`watch` session.
///
/// Produced once by [`resolve_config`] and shared read-only behind an `Arc`
/// by every pipeline invocation of the session.
#[derive(Clone)]
pub struct ResolvedConfig {
    /// Absolute, normalized project root.
    pub root: PathBuf,

    /// Include entries relative to `root`.
    pub include: Vec<String>,

    /// Absolute output directory, if any.
    pub output: Option<PathBuf>,

    /// Built-in transform plugin first, then user plugins in order.
    pub plugins: Vec<Plugin>,

    /// Source suffixes eligible for transformation.
    pub extensions: Vec<String>,

    /// Suffixes copied verbatim by the watcher.
    pub static_extensions: Vec<String>,

    /// Engine options after defaults and `config_resolved` negotiation.
    pub transform_options: TransformOptions,

    pub watch: WatchOptions,

    pub fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("root", &self.root)
            .field("include", &self.include)
            .field("output", &self.output)
            .field(
                "plugins",
                &self.plugins.iter().map(Plugin::name).collect::<Vec<_>>(),
            )
            .field("extensions", &self.extensions)
            .field("static_extensions", &self.static_extensions)
            .field("transform_options", &self.transform_options)
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}

impl ResolvedConfig {
    /// Is `path` a file the pipeline transforms?
    pub fn is_source_extension(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Is `path` a static asset the watcher copies verbatim?
    pub fn is_static_extension(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.static_extensions.contains(&ext))
    }

    /// Mapping helpers bound to this config.
    pub fn experimental(&self) -> Experimental<'_> {
        Experimental { config: self }
    }
}

/// Path mapping functions closed over a [`ResolvedConfig`].
///
/// Unstable surface for plugins that want to reproduce the build's own file
/// selection and output layout.
#[derive(Debug, Clone, Copy)]
pub struct Experimental<'a> {
    config: &'a ResolvedConfig,
}

impl Experimental<'_> {
    /// Files selected by the configured include list.
    pub fn include_to_files(&self) -> Result<Vec<PathBuf>> {
        paths::files_for(self.config, &self.config.include)
    }

    /// Files selected by an arbitrary include list.
    pub fn files_for(&self, include: &[String]) -> Result<Vec<PathBuf>> {
        paths::files_for(self.config, include)
    }

    /// Globs for the configured include list.
    pub fn include_to_globs(&self) -> Vec<String> {
        paths::globs_for(self.config, &self.config.include)
    }

    /// Globs for an arbitrary include list.
    pub fn globs_for(&self, include: &[String]) -> Vec<String> {
        paths::globs_for(self.config, include)
    }

    /// Output path for `filename`, or `None` when building in memory.
    pub fn input_to_output(&self, filename: &Path) -> Option<PathBuf> {
        paths::destination_for(self.config, filename)
    }
}

/// Normalize a [`Configuration`] and run every plugin's `config_resolved`
/// hook, in order, to negotiate the final transform options.
///
/// Include paths are not checked for existence; entries that match nothing
/// simply contribute no files.
pub async fn resolve_config(config: Configuration) -> Result<Arc<ResolvedConfig>> {
    let Configuration {
        root,
        include,
        output,
        plugins: user_plugins,
        transform_options,
        watch,
        engine,
        fs,
    } = config;

    let cwd = std::env::current_dir()?;
    let root = match root {
        Some(root) => absolutize(&root, &cwd),
        None => normalize_path(&cwd),
    };

    let include = include
        .iter()
        .map(|entry| relative_include(&root, entry))
        .collect();
    let output = output.map(|output| absolutize(&output, &root));

    let engine: Arc<dyn TransformEngine> = engine.unwrap_or_else(|| Arc::new(IdentityEngine));
    let mut plugins = Vec::with_capacity(user_plugins.len() + 1);
    plugins.push(builtin::transform_plugin(engine));
    plugins.extend(user_plugins);

    let mut resolved = ResolvedConfig {
        root,
        include,
        output,
        plugins,
        extensions: JS_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        static_extensions: STATIC_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        transform_options: transform_options.merge_defaults(&default_transform_options()),
        watch,
        fs: fs.unwrap_or_else(|| Arc::new(RealFileSystem)),
    };

    debug!(
        root = %resolved.root.display(),
        include = ?resolved.include,
        output = ?resolved.output,
        plugins = resolved.plugins.len(),
        "configuration normalized"
    );

    // Each hook sees the options negotiated so far and may hand back a
    // replacement for the next one.
    for plugin in resolved.plugins.clone() {
        let Some(hook) = plugin.config_resolved_hook() else {
            continue;
        };
        debug!(plugin = %plugin.name(), "running config_resolved hook");

        let snapshot = Arc::new(resolved.clone());
        let current = resolved.transform_options.clone();
        let negotiated = hook(snapshot, current)
            .await
            .map_err(|err| hook_error(plugin.name(), "config_resolved", err))?;

        if let Some(options) = negotiated {
            resolved.transform_options = options;
        }
    }

    Ok(Arc::new(resolved))
}

/// Express an include entry relative to `root`.
fn relative_include(root: &Path, entry: &str) -> String {
    let normalized = normalize_path(Path::new(entry));
    match normalized.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => slash(rel),
        _ => slash(&normalized),
    }
}
