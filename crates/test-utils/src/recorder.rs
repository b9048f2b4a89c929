use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use filemill::config::TransformOptions;
use filemill::engine::BuildResult;
use filemill::plugin::{Plugin, TransformResult};
use filemill::watch::WatchEventKind;

/// A hook invocation seen by a [`HookRecorder`] plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    ConfigResolved {
        plugin: String,
        options: TransformOptions,
    },
    Watch {
        plugin: String,
        kind: WatchEventKind,
        path: PathBuf,
    },
    Transform {
        plugin: String,
        filename: PathBuf,
    },
    Done {
        plugin: String,
        result: BuildResult,
    },
}

/// Shared log of hook invocations across any number of recording plugins.
///
/// Cloning shares the log, so plugins built from one recorder interleave
/// their calls in the order they actually happened.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    calls: Arc<Mutex<Vec<HookCall>>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plugin named `name` that records all four hooks and changes nothing.
    pub fn plugin(&self, name: &str) -> Plugin {
        let on_resolved = self.clone();
        let on_watch = self.clone();
        let on_transform = self.clone();
        let on_done = self.clone();
        let (n1, n2, n3, n4) = (
            name.to_string(),
            name.to_string(),
            name.to_string(),
            name.to_string(),
        );

        Plugin::new(name)
            .on_config_resolved(move |_config, options: TransformOptions| {
                on_resolved.push(HookCall::ConfigResolved {
                    plugin: n1.clone(),
                    options,
                });
                async { anyhow::Ok(None::<TransformOptions>) }
            })
            .on_watch(move |kind, path| {
                on_watch.push(HookCall::Watch {
                    plugin: n2.clone(),
                    kind,
                    path: path.to_path_buf(),
                });
            })
            .on_transform(move |args| {
                on_transform.push(HookCall::Transform {
                    plugin: n3.clone(),
                    filename: args.filename.clone(),
                });
                async { anyhow::Ok(TransformResult::NoChange) }
            })
            .on_done(move |result| {
                on_done.push(HookCall::Done {
                    plugin: n4.clone(),
                    result,
                });
                async { anyhow::Ok(()) }
            })
    }

    pub fn push(&self, call: HookCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `(kind, path)` of every recorded `on_watch` call.
    pub fn watch_events(&self) -> Vec<(WatchEventKind, PathBuf)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Watch { kind, path, .. } => Some((kind, path)),
                _ => None,
            })
            .collect()
    }

    /// Every recorded `on_done` result.
    pub fn done_results(&self) -> Vec<BuildResult> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Done { result, .. } => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Poll until `predicate` holds for the recorded calls.
    ///
    /// Wrap in [`crate::with_timeout`]; this never gives up on its own.
    pub async fn wait_until<F>(&self, predicate: F)
    where
        F: Fn(&[HookCall]) -> bool,
    {
        loop {
            if predicate(&self.calls()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Wait until at least `n` `on_done` calls were recorded.
    pub async fn wait_for_done(&self, n: usize) {
        self.wait_until(|calls| {
            calls
                .iter()
                .filter(|c| matches!(c, HookCall::Done { .. }))
                .count()
                >= n
        })
        .await
    }
}
