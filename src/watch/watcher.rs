// src/watch/watcher.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{resolve_config, Configuration, ResolvedConfig};
use crate::errors::{FilemillError, Result};
use crate::fs::FileSystem;
use crate::paths::GlobPatternSet;
use crate::watch::events::EventTranslator;
use crate::watch::handler::handle_event;
use crate::watch::{WatchEvent, WatchEventKind};

/// A running watch session.
///
/// Keeps the debounced OS subscription alive. Dropping or closing it stops dispatching
/// new events; actions already in flight run to completion.
pub struct Watcher {
    config: Arc<ResolvedConfig>,
    inner: Option<Debouncer<RecommendedWatcher>>,
    dispatch: JoinHandle<()>,
    errors: mpsc::UnboundedReceiver<FilemillError>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.config.root)
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl Watcher {
    /// The configuration this session was resolved with.
    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    /// Next error raised while handling an event.
    ///
    /// Handler failures never stop the watcher; they are logged and queued
    /// here. Returns `None` once the watcher is closed and every in-flight
    /// action has finished.
    pub async fn next_error(&mut self) -> Option<FilemillError> {
        self.errors.recv().await
    }

    /// Release the OS subscription and stop dispatching events.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            self.dispatch.abort();
            info!(root = %self.config.root.display(), "file watcher closed");
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolve `config` and start watching its include set.
pub async fn watch(config: Configuration) -> Result<Watcher> {
    let resolved = resolve_config(config).await?;
    start_watcher(resolved)
}

/// Start watching an already resolved configuration.
///
/// The OS subscription is in place before this returns, so no change made
/// after the call is lost. Must be called from within a Tokio runtime.
pub fn start_watcher(config: Arc<ResolvedConfig>) -> Result<Watcher> {
    let fs = Arc::clone(&config.fs);
    let globs = config.experimental().include_to_globs();
    let mut patterns = GlobPatternSet::new(&globs)?;
    patterns.canonicalize_bases(fs.as_ref());

    // Channel from the debouncer thread into the async world. Each message
    // is a batch of paths that have been quiet for the settle window.
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<DebounceEventResult>();
    let mut inner = new_debouncer(
        config.watch.change_throttle.max(MIN_SETTLE),
        move |res: DebounceEventResult| {
            // Only fails once the dispatch loop is gone, i.e. after close.
            let _ = raw_tx.send(res);
        },
    )?;

    for (path, mode) in watch_roots(&patterns, fs.as_ref()) {
        inner.watcher().watch(&path, mode)?;
        debug!(path = %path.display(), ?mode, "watching");
    }

    info!(root = %config.root.display(), globs = ?globs, "file watcher started");

    // Initial scan happens after subscribing; anything that changes during
    // the scan is already buffered in the channel.
    let (files, dirs) = patterns.enumerate(fs.as_ref(), true)?;
    let initial = if config.watch.ignore_initial {
        Vec::new()
    } else {
        dirs.iter()
            .map(|dir| WatchEvent::new(WatchEventKind::AddDir, dir.clone()))
            .chain(
                files
                    .iter()
                    .map(|file| WatchEvent::new(WatchEventKind::Add, file.clone())),
            )
            .collect()
    };

    let mut translator = EventTranslator::new(patterns, fs);
    translator.seed(&files, &dirs);

    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let dispatch = tokio::spawn(dispatch_loop(
        Arc::clone(&config),
        translator,
        initial,
        raw_rx,
        error_tx,
    ));

    Ok(Watcher {
        config,
        inner: Some(inner),
        dispatch,
        errors: error_rx,
    })
}

/// The debouncer polls at a fraction of its timeout; zero would spin.
const MIN_SETTLE: Duration = Duration::from_millis(1);

/// Directories to subscribe to: each glob's base recursively, and the parent
/// of each literal file (watching the file itself loses it on atomic saves).
fn watch_roots(patterns: &GlobPatternSet, fs: &dyn FileSystem) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut roots: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();

    for pattern in patterns.patterns() {
        let (dir, mode) = if pattern.is_literal() {
            match pattern.base().parent() {
                Some(parent) => (parent.to_path_buf(), RecursiveMode::NonRecursive),
                None => continue,
            }
        } else {
            (pattern.base().to_path_buf(), RecursiveMode::Recursive)
        };

        if !fs.is_dir(&dir) {
            warn!(path = %dir.display(), "include base does not exist, not watching it");
            continue;
        }

        let entry = roots.entry(dir).or_insert(mode);
        if mode == RecursiveMode::Recursive {
            *entry = RecursiveMode::Recursive;
        }
    }

    roots
}

async fn dispatch_loop(
    config: Arc<ResolvedConfig>,
    mut translator: EventTranslator,
    initial: Vec<WatchEvent>,
    mut raw_rx: mpsc::UnboundedReceiver<DebounceEventResult>,
    errors: mpsc::UnboundedSender<FilemillError>,
) {
    for event in initial {
        dispatch(&config, event, &errors);
    }

    while let Some(batch) = raw_rx.recv().await {
        match batch {
            Ok(events) => {
                // `AnyContinuous` marks a path that is still being written;
                // its final `Any` follows once it goes quiet.
                let settled = events
                    .into_iter()
                    .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
                    .map(|event| event.path);
                for translated in translator.translate(settled) {
                    dispatch(&config, translated, &errors);
                }
            }
            Err(err) => {
                error!(error = %err, "file watch error");
                let _ = errors.send(FilemillError::WatchError(err));
            }
        }
    }

    debug!("watch dispatch loop ended");
}

/// Run `on_watch` hooks in plugin order, then spawn the event's action.
fn dispatch(
    config: &Arc<ResolvedConfig>,
    event: WatchEvent,
    errors: &mpsc::UnboundedSender<FilemillError>,
) {
    debug!(kind = %event.kind, path = %event.path.display(), "dispatching watch event");

    for plugin in &config.plugins {
        if let Some(hook) = plugin.watch_hook() {
            hook(event.kind, &event.path);
        }
    }

    let config = Arc::clone(config);
    let errors = errors.clone();
    tokio::spawn(async move {
        if let Err(err) = handle_event(&config, &event).await {
            error!(
                kind = %event.kind,
                path = %event.path.display(),
                error = %err,
                "watch event handling failed"
            );
            let _ = errors.send(err);
        }
    });
}
