// src/paths/patterns.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::fs::FileSystem;
use crate::paths::normalize::slash;

/// Characters that turn an include entry into a glob pattern.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Returns true if `s` contains glob metacharacters.
pub fn has_glob_meta(s: &str) -> bool {
    s.contains(GLOB_META)
}

/// A single absolute glob, split into its literal base directory and the
/// pattern evaluated relative to that base.
///
/// `"/p/src/**/*.ts"` has base `/p/src` and relative pattern `**/*.ts`. A
/// pattern without metacharacters is a literal file and matches only its own
/// path.
#[derive(Clone)]
pub struct GlobPattern {
    source: String,
    base: PathBuf,
    canonical_base: Option<PathBuf>,
    matcher: Option<GlobMatcher>,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPattern")
            .field("source", &self.source)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let segments: Vec<&str> = pattern.split('/').collect();
        let literal_len = segments
            .iter()
            .take_while(|segment| !has_glob_meta(segment))
            .count();

        if literal_len == segments.len() {
            return Ok(Self {
                source: pattern.to_string(),
                base: PathBuf::from(pattern),
                canonical_base: None,
                matcher: None,
            });
        }

        let base = match segments[..literal_len].join("/") {
            s if s.is_empty() && pattern.starts_with('/') => "/".to_string(),
            s if s.is_empty() => ".".to_string(),
            s => s,
        };
        let rest = segments[literal_len..].join("/");

        let matcher = GlobBuilder::new(&rest)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();

        Ok(Self {
            source: pattern.to_string(),
            base: PathBuf::from(base),
            canonical_base: None,
            matcher: Some(matcher),
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Literal directory the pattern is anchored at (or the file itself for
    /// literal patterns).
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_literal(&self) -> bool {
        self.matcher.is_none()
    }

    /// Returns true if `path` is matched by this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        match &self.matcher {
            None => path == self.base,
            Some(matcher) => match path.strip_prefix(&self.base) {
                Ok(rel) if !rel.as_os_str().is_empty() => matcher.is_match(slash(rel)),
                _ => false,
            },
        }
    }

    /// Map a path reported by the OS watcher back onto this pattern's base.
    ///
    /// Watchers may report canonical paths (`/private/var/...`) for a base
    /// configured as `/var/...`; those are rewritten so downstream mapping
    /// sees the configured form.
    fn logical_path(&self, reported: &Path) -> Option<PathBuf> {
        if reported.starts_with(&self.base) {
            return Some(reported.to_path_buf());
        }
        let canonical = self.canonical_base.as_ref()?;
        let rel = reported.strip_prefix(canonical).ok()?;
        if rel.as_os_str().is_empty() {
            Some(self.base.clone())
        } else {
            Some(self.base.join(rel))
        }
    }
}

/// A set of include globs, as produced by [`crate::paths::globs_for`].
#[derive(Debug, Clone, Default)]
pub struct GlobPatternSet {
    patterns: Vec<GlobPattern>,
}

impl GlobPatternSet {
    pub fn new(globs: &[String]) -> Result<Self> {
        let patterns = globs
            .iter()
            .map(|g| GlobPattern::new(g))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[GlobPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Record canonical forms of every base so [`GlobPatternSet::resolve`]
    /// can recognise paths reported through symlinked prefixes.
    pub fn canonicalize_bases(&mut self, fs: &dyn FileSystem) {
        for pattern in &mut self.patterns {
            pattern.canonical_base = fs
                .canonicalize(&pattern.base)
                .ok()
                .filter(|c| c != &pattern.base);
        }
    }

    /// Returns true if any pattern matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Translate a watcher-reported path into its configured form, returning
    /// `None` if no pattern matches it.
    pub fn resolve(&self, reported: &Path) -> Option<PathBuf> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .logical_path(reported)
                .filter(|logical| pattern.matches(logical))
        })
    }

    /// Enumerate all files matched by the set, in pattern order, deduplicated.
    ///
    /// Directory entries are visited in sorted order so the result is stable
    /// for a given tree.
    pub fn enumerate_files(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        let (files, _dirs) = self.enumerate(fs, false)?;
        Ok(files)
    }

    /// Enumerate matched files and matched directories (below each base).
    pub fn enumerate(
        &self,
        fs: &dyn FileSystem,
        with_dirs: bool,
    ) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        let mut seen = HashSet::new();

        for pattern in &self.patterns {
            if pattern.is_literal() {
                if fs.is_file(&pattern.base) && seen.insert(pattern.base.clone()) {
                    files.push(pattern.base.clone());
                }
                continue;
            }
            if !fs.is_dir(&pattern.base) {
                continue;
            }
            walk(fs, &pattern.base, &mut |path, is_dir| {
                if !pattern.matches(path) || !seen.insert(path.to_path_buf()) {
                    return;
                }
                if is_dir {
                    if with_dirs {
                        dirs.push(path.to_path_buf());
                    }
                } else {
                    files.push(path.to_path_buf());
                }
            })
            .with_context(|| format!("enumerating files for glob {}", pattern.as_str()))?;
        }

        Ok((files, dirs))
    }
}

fn walk(
    fs: &dyn FileSystem,
    dir: &Path,
    visit: &mut dyn FnMut(&Path, bool),
) -> Result<()> {
    let mut entries = fs.read_dir(dir)?;
    entries.sort();

    for path in entries {
        if fs.is_dir(&path) {
            visit(&path, true);
            walk(fs, &path, visit)?;
        } else if fs.is_file(&path) {
            visit(&path, false);
        }
    }
    Ok(())
}
