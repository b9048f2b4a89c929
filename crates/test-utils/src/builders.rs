#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filemill::config::Configuration;
use tempfile::TempDir;

/// A scratch project directory for tests.
///
/// Files are written relative to the project root; the directory is removed
/// when the value is dropped.
pub struct ProjectBuilder {
    dir: TempDir,
}

impl ProjectBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("creating temp project dir")?,
        })
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `root` joined with `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn file(self, rel: &str, contents: &str) -> Result<Self> {
        write_file(&self.path(rel), contents)?;
        Ok(self)
    }

    /// Create an (empty) directory.
    pub fn dir(self, rel: &str) -> Result<Self> {
        fs::create_dir_all(self.path(rel)).with_context(|| format!("creating dir {rel}"))?;
        Ok(self)
    }

    /// A configuration rooted at this project.
    pub fn config<I, S>(&self, include: I) -> Configuration
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Configuration::new(include).root(self.root())
    }

    /// Read a file relative to the root.
    pub fn read(&self, rel: &str) -> Result<String> {
        fs::read_to_string(self.path(rel)).with_context(|| format!("reading {rel}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// All files below `rel`, relative to it, with forward slashes, sorted.
    pub fn list(&self, rel: &str) -> Result<Vec<String>> {
        let base = self.path(rel);
        let mut out = Vec::new();
        collect(&base, &base, &mut out)?;
        out.sort();
        Ok(out)
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {:?}", path))
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(base, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
