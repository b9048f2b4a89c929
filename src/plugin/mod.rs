// src/plugin/mod.rs

//! Plugin contract.
//!
//! A [`Plugin`] is a named bundle of up to four optional hooks:
//!
//! - `config_resolved`: negotiate transform options, once per session.
//! - `on_watch`: observe every watch event, synchronously.
//! - `transform`: rewrite one file's code (and optionally its source map).
//! - `on_done`: observe a finished build or delete action.
//!
//! Hooks always run in registration order with the built-in transform plugin
//! first. The pipeline checks for a hook's presence before invoking it.

pub mod builtin;

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ResolvedConfig, TransformOptions};
use crate::engine::BuildResult;
use crate::errors::FilemillError;
use crate::watch::WatchEventKind;

/// Boxed future returned by async hooks.
pub type HookFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

pub(crate) type ConfigResolvedHook = Arc<
    dyn Fn(Arc<ResolvedConfig>, TransformOptions) -> HookFuture<Option<TransformOptions>>
        + Send
        + Sync,
>;
pub(crate) type WatchHook = Arc<dyn Fn(WatchEventKind, &Path) + Send + Sync>;
pub(crate) type TransformHook = Arc<dyn Fn(TransformArgs) -> HookFuture<TransformResult> + Send + Sync>;
pub(crate) type DoneHook = Arc<dyn Fn(BuildResult) -> HookFuture<()> + Send + Sync>;

/// A named set of optional hooks.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    config_resolved: Option<ConfigResolvedHook>,
    on_watch: Option<WatchHook>,
    transform: Option<TransformHook>,
    on_done: Option<DoneHook>,
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("config_resolved", &self.config_resolved.is_some())
            .field("on_watch", &self.on_watch.is_some())
            .field("transform", &self.transform.is_some())
            .field("on_done", &self.on_done.is_some())
            .finish()
    }
}

impl Plugin {
    /// A plugin with no hooks. Attach them with the `on_*` builders.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_resolved: None,
            on_watch: None,
            transform: None,
            on_done: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Called once after the configuration is resolved, in plugin order.
    ///
    /// Receives a snapshot of the configuration and the options negotiated so
    /// far. Returning `Some(options)` hands a replacement to the next plugin.
    pub fn on_config_resolved<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<ResolvedConfig>, TransformOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<TransformOptions>>> + Send + 'static,
    {
        self.config_resolved = Some(Arc::new(
            move |config: Arc<ResolvedConfig>,
                  options: TransformOptions|
                  -> HookFuture<Option<TransformOptions>> {
                Box::pin(hook(config, options))
            },
        ));
        self
    }

    /// Called for every watch event before its action runs.
    pub fn on_watch<F>(mut self, hook: F) -> Self
    where
        F: Fn(WatchEventKind, &Path) + Send + Sync + 'static,
    {
        self.on_watch = Some(Arc::new(hook));
        self
    }

    pub fn on_transform<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(TransformArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TransformResult>> + Send + 'static,
    {
        self.transform = Some(Arc::new(
            move |args: TransformArgs| -> HookFuture<TransformResult> { Box::pin(hook(args)) },
        ));
        self
    }

    /// Called after a file was built (or an output removed), in plugin order.
    pub fn on_done<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BuildResult) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_done = Some(Arc::new(
            move |result: BuildResult| -> HookFuture<()> { Box::pin(hook(result)) },
        ));
        self
    }

    pub(crate) fn config_resolved_hook(&self) -> Option<&ConfigResolvedHook> {
        self.config_resolved.as_ref()
    }

    pub(crate) fn watch_hook(&self) -> Option<&WatchHook> {
        self.on_watch.as_ref()
    }

    pub(crate) fn transform_hook(&self) -> Option<&TransformHook> {
        self.transform.as_ref()
    }

    pub(crate) fn done_hook(&self) -> Option<&DoneHook> {
        self.on_done.as_ref()
    }
}

/// Lets a `transform` hook stop the chain for the current file.
///
/// Once signalled, no later plugin's `transform` hook runs for this file.
#[derive(Debug, Clone, Default)]
pub struct DoneSignal(Arc<AtomicBool>);

impl DoneSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_done(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Input to a `transform` hook.
#[derive(Debug, Clone)]
pub struct TransformArgs {
    /// Absolute source path.
    pub filename: PathBuf,
    /// Code as left by the previous plugin.
    pub code: String,
    pub config: Arc<ResolvedConfig>,
    pub done: DoneSignal,
}

/// What a `transform` hook did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    /// Leave code and map as they are.
    NoChange,
    /// Replace the code, keep the current map.
    Code(String),
    /// Replace the code; replace the map only if one is given.
    Structured { code: String, map: Option<String> },
}

/// Attribute a hook failure to its plugin.
///
/// Errors that already are a [`FilemillError`] (e.g. an engine's transform
/// error) pass through unchanged.
pub(crate) fn hook_error(plugin: &str, hook: &'static str, err: anyhow::Error) -> FilemillError {
    match err.downcast::<FilemillError>() {
        Ok(err) => err,
        Err(source) => FilemillError::Hook {
            plugin: plugin.to_string(),
            hook,
            source,
        },
    }
}
