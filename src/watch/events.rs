// src/watch/events.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::paths::GlobPatternSet;
use crate::watch::{WatchEvent, WatchEventKind};

/// Turns settled paths from the debouncer into [`WatchEvent`]s.
///
/// Keeps a table of the files and directories it has reported so far, which
/// is how `add` is told apart from `change` and `unlink` from `unlinkDir`.
/// The debouncer only says *that* a path was touched; what the path looks
/// like once it went quiet decides the kind.
///
/// The translator is owned by a single dispatch task and is not shared.
#[derive(Debug)]
pub struct EventTranslator {
    patterns: GlobPatternSet,
    fs: Arc<dyn FileSystem>,
    known_files: HashSet<PathBuf>,
    known_dirs: HashSet<PathBuf>,
}

impl EventTranslator {
    pub fn new(patterns: GlobPatternSet, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            patterns,
            fs,
            known_files: HashSet::new(),
            known_dirs: HashSet::new(),
        }
    }

    /// Record paths that already existed when watching started.
    pub fn seed(&mut self, files: &[PathBuf], dirs: &[PathBuf]) {
        self.known_files.extend(files.iter().cloned());
        self.known_dirs.extend(dirs.iter().cloned());
    }

    pub fn is_known(&self, path: &Path) -> bool {
        self.known_files.contains(path) || self.known_dirs.contains(path)
    }

    /// Translate one batch of settled paths.
    ///
    /// Paths are handled parents first, so a new directory's scan reports
    /// its files once and their own entries in the batch are skipped.
    pub fn translate<I, P>(&mut self, settled: I) -> Vec<WatchEvent>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut paths: Vec<PathBuf> = settled
            .into_iter()
            .filter_map(|reported| {
                let reported = reported.as_ref();
                let resolved = self.patterns.resolve(reported);
                if resolved.is_none() {
                    trace!(path = %reported.display(), "ignoring path outside include globs");
                }
                resolved
            })
            .collect();
        paths.sort();
        paths.dedup();

        let mut ready = Vec::new();
        for path in paths {
            if ready.iter().any(|event: &WatchEvent| event.path == path) {
                continue;
            }

            if self.fs.exists(&path) {
                self.present(path, &mut ready);
            } else {
                self.absent(path, &mut ready);
            }
        }

        if !ready.is_empty() {
            debug!(events = ?ready, "translated settled paths");
        }
        ready
    }

    fn present(&mut self, path: PathBuf, ready: &mut Vec<WatchEvent>) {
        if self.fs.is_dir(&path) {
            if self.known_dirs.insert(path.clone()) {
                ready.push(WatchEvent::new(WatchEventKind::AddDir, path.clone()));
                self.scan_new_dir(&path, ready);
            }
            return;
        }

        let kind = if self.known_files.insert(path.clone()) {
            WatchEventKind::Add
        } else {
            WatchEventKind::Change
        };
        ready.push(WatchEvent::new(kind, path));
    }

    /// A path that is gone. Never-reported paths (created and removed inside
    /// one window) produce nothing.
    fn absent(&mut self, path: PathBuf, ready: &mut Vec<WatchEvent>) {
        if self.known_files.remove(&path) {
            ready.push(WatchEvent::new(WatchEventKind::Unlink, path));
            return;
        }

        if self.known_dirs.remove(&path) {
            let mut files: Vec<PathBuf> = self
                .known_files
                .iter()
                .filter(|f| f.starts_with(&path))
                .cloned()
                .collect();
            files.sort();
            for file in files {
                self.known_files.remove(&file);
                ready.push(WatchEvent::new(WatchEventKind::Unlink, file));
            }

            let mut dirs: Vec<PathBuf> = self
                .known_dirs
                .iter()
                .filter(|d| d.starts_with(&path))
                .cloned()
                .collect();
            // Deepest first, like a recursive removal reports them.
            dirs.sort_by(|a, b| b.cmp(a));
            for dir in dirs {
                self.known_dirs.remove(&dir);
                ready.push(WatchEvent::new(WatchEventKind::UnlinkDir, dir));
            }

            ready.push(WatchEvent::new(WatchEventKind::UnlinkDir, path));
        }
    }

    fn scan_new_dir(&mut self, dir: &Path, ready: &mut Vec<WatchEvent>) {
        let Ok(mut entries) = self.fs.read_dir(dir) else {
            return;
        };
        entries.sort();

        for entry in entries {
            if self.patterns.matches(&entry) {
                self.present(entry, ready);
            } else if self.fs.is_dir(&entry) {
                self.scan_new_dir(&entry, ready);
            }
        }
    }
}
