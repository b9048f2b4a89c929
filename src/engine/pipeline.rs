// src/engine/pipeline.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, trace};

use crate::config::ResolvedConfig;
use crate::errors::Result;
use crate::plugin::{hook_error, DoneSignal, TransformArgs, TransformResult};

/// Final code and map for one file after the `transform` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
    /// Raw JSON, exactly as the last stage that supplied a map returned it.
    pub map: Option<String>,
}

/// Run every plugin's `transform` hook over `filename`, in plugin order.
///
/// Stops as soon as a hook signals `done`. Maps are not composed across
/// stages: the most recent stage that explicitly returned a map wins.
pub async fn transform_one(config: &Arc<ResolvedConfig>, filename: &Path) -> Result<TransformOutput> {
    let mut code = config
        .fs
        .read_to_string(filename)
        .with_context(|| format!("reading source {}", filename.display()))?;
    let mut map: Option<String> = None;
    let done = DoneSignal::new();

    for plugin in &config.plugins {
        if done.is_done() {
            trace!(file = %filename.display(), "transform chain stopped early");
            break;
        }
        let Some(hook) = plugin.transform_hook() else {
            continue;
        };

        debug!(plugin = %plugin.name(), file = %filename.display(), "running transform hook");
        let args = TransformArgs {
            filename: filename.to_path_buf(),
            code: code.clone(),
            config: Arc::clone(config),
            done: done.clone(),
        };

        let result = hook(args)
            .await
            .map_err(|err| hook_error(plugin.name(), "transform", err))?;

        match result {
            TransformResult::NoChange => {}
            TransformResult::Code(next) => code = next,
            TransformResult::Structured { code: next, map: next_map } => {
                code = next;
                if next_map.is_some() {
                    map = next_map;
                }
            }
        }
    }

    Ok(TransformOutput { code, map })
}
