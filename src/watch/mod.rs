// src/watch/mod.rs

//! Watch mode.
//!
//! This module is responsible for:
//! - Subscribing to filesystem changes over the resolved include globs
//!   (`notify`, debounced by `notify-debouncer-mini`).
//! - Translating raw OS notifications into `add` / `change` / `addDir` /
//!   `unlink` / `unlinkDir` events (`events.rs`).
//! - Running `on_watch` hooks and the per-event build, copy or delete
//!   action (`handler.rs`).
//!
//! Each event is handled in its own task; handling of rapid successive
//! events may overlap.

pub mod events;
pub mod handler;
pub mod watcher;

use std::fmt;
use std::path::PathBuf;

pub use events::EventTranslator;
pub use handler::handle_event;
pub use watcher::{start_watcher, watch, Watcher};

/// Kind of a translated watch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Add,
    Change,
    AddDir,
    Unlink,
    UnlinkDir,
}

impl WatchEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchEventKind::Add => "add",
            WatchEventKind::Change => "change",
            WatchEventKind::AddDir => "addDir",
            WatchEventKind::Unlink => "unlink",
            WatchEventKind::UnlinkDir => "unlinkDir",
        }
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One translated event for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// Absolute path, in the form the include globs were configured with.
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}
