// src/paths/mod.rs

//! Include resolution and input→output path mapping.
//!
//! Everything here is a pure function of a [`ResolvedConfig`] plus whatever
//! the configured [`crate::fs::FileSystem`] reports about existing paths:
//!
//! - [`globs_for`] turns include entries into absolute glob patterns.
//! - [`files_for`] enumerates those globs into source files.
//! - [`destination_for`] maps a source file onto the output tree.

pub mod normalize;
pub mod patterns;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ResolvedConfig;
use crate::errors::Result;

pub use normalize::{absolutize, normalize_path, relative_path, slash};
pub use patterns::{has_glob_meta, GlobPattern, GlobPatternSet};

/// Source file suffixes eligible for transformation, in lookup order.
pub const JS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Files copied verbatim to the output tree in watch mode.
pub const STATIC_EXTENSIONS: &[&str] = &[".json", ".node", ".wasm"];

/// Extension every transformed source file is written with.
pub const OUTPUT_EXTENSION: &str = "js";

/// Dotted extension of `path` (`".ts"`), if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// TypeScript declaration files never produce output.
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(".d.ts"))
        .unwrap_or(false)
}

/// Turn include entries into absolute, forward-slash glob patterns.
///
/// Per entry, joined onto `root`:
/// - an existing directory becomes `<dir>/**/*`,
/// - an existing file is used as-is,
/// - an entry with glob metacharacters is kept as a glob,
/// - otherwise each allowed extension is tried in order and the first
///   existing file wins.
///
/// Entries that resolve to nothing are dropped.
pub fn globs_for(config: &ResolvedConfig, include: &[String]) -> Vec<String> {
    let fs = config.fs.as_ref();

    include
        .iter()
        .filter_map(|entry| {
            let abs = absolutize(Path::new(entry), &config.root);
            let abs_str = slash(&abs);

            if fs.is_dir(&abs) {
                return Some(format!("{}/**/*", abs_str.trim_end_matches('/')));
            }
            if fs.is_file(&abs) || has_glob_meta(entry) {
                return Some(abs_str);
            }

            config
                .extensions
                .iter()
                .map(|ext| format!("{abs_str}{ext}"))
                .find(|candidate| fs.is_file(Path::new(candidate)))
        })
        .collect()
}

/// Enumerate every source file selected by `include`.
///
/// Paths are absolute, deduplicated (first occurrence wins) and restricted to
/// the configured extension allow-list.
pub fn files_for(config: &ResolvedConfig, include: &[String]) -> Result<Vec<PathBuf>> {
    let globs = globs_for(config, include);
    let set = GlobPatternSet::new(&globs)?;
    let enumerated = set.enumerate_files(config.fs.as_ref())?;

    let mut seen = HashSet::new();
    let files = enumerated
        .into_iter()
        .filter(|path| config.is_source_extension(path))
        .filter(|path| seen.insert(path.clone()))
        .collect();

    Ok(files)
}

/// Map a source file onto the output tree.
///
/// Returns `None` when no output directory is configured. With exactly one
/// include entry its leading directory is dropped (`src/main.ts` →
/// `dist/main.js`); with several entries the segment is kept so roots cannot
/// collide (`src/main.ts` → `dist/src/main.js`). Allowed source extensions
/// are rewritten to `.js`, anything else keeps its name.
pub fn destination_for(config: &ResolvedConfig, filename: &Path) -> Option<PathBuf> {
    let output = config.output.as_ref()?;

    let filename = normalize_path(filename);
    let relative = match filename.strip_prefix(&config.root) {
        Ok(rel) => slash(rel),
        Err(_) => slash(&filename).trim_start_matches('/').to_string(),
    };

    let relative = if config.include.len() == 1 {
        match relative.split_once('/') {
            Some((_, rest)) => rest.to_string(),
            None => relative,
        }
    } else {
        relative
    };

    let destination = normalize_path(&output.join(relative));
    if config.is_source_extension(&destination) {
        Some(destination.with_extension(OUTPUT_EXTENSION))
    } else {
        Some(destination)
    }
}
