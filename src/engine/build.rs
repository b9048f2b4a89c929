// src/engine/build.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{resolve_config, Configuration, ResolvedConfig};
use crate::engine::pipeline::{transform_one, TransformOutput};
use crate::engine::sourcemap::{map_path_for, source_mapping_url_comment, SourceMap};
use crate::engine::BuildResult;
use crate::errors::{FilemillError, Result};
use crate::paths::{destination_for, normalize_path, relative_path};
use crate::plugin::hook_error;

/// Resolve `config` and build every included file.
///
/// Files are built concurrently; results come back in enumeration order.
/// The first failure fails the whole batch and aborts the files still in
/// flight.
pub async fn build(config: Configuration) -> Result<Vec<BuildResult>> {
    let resolved = resolve_config(config).await?;
    build_resolved(&resolved).await
}

/// Like [`build`], for an already resolved configuration.
pub async fn build_resolved(config: &Arc<ResolvedConfig>) -> Result<Vec<BuildResult>> {
    let files = config.experimental().include_to_files()?;
    info!(files = files.len(), root = %config.root.display(), "starting build");

    let mut tasks = JoinSet::new();
    for (index, filename) in files.into_iter().enumerate() {
        let config = Arc::clone(config);
        tasks.spawn(async move { (index, build_file(&config, &filename).await) });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = joined.map_err(|err| anyhow!("build task failed: {err}"))?;
        match outcome {
            Ok(result) => results.push((index, result)),
            Err(err) => {
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}

/// Build a single file: transform, write (or keep in memory), run `on_done`.
///
/// Fails before writing anything if the file would overwrite itself.
pub async fn build_file(config: &Arc<ResolvedConfig>, filename: &Path) -> Result<BuildResult> {
    let TransformOutput { code, map } = transform_one(config, filename).await?;

    let result = match destination_for(config, filename) {
        Some(destname) => {
            if destname == normalize_path(filename) {
                return Err(FilemillError::SameInputOutput {
                    filename: filename.to_path_buf(),
                });
            }
            write_output(config, filename, &destname, code, map)?;
            BuildResult::written(filename, destname)
        }
        None => BuildResult::in_memory(filename, code, map),
    };

    run_done_hooks(config, &result).await?;
    Ok(result)
}

fn write_output(
    config: &ResolvedConfig,
    filename: &Path,
    destname: &Path,
    mut code: String,
    map: Option<String>,
) -> Result<()> {
    let fs = config.fs.as_ref();

    if let Some(parent) = destname.parent() {
        fs.create_dir_all(parent)?;
    }

    if let Some(raw) = map {
        match SourceMap::parse(&raw) {
            Ok(mut source_map) => {
                source_map.relocate(filename, destname);
                fs.write(&map_path_for(destname), source_map.to_json()?.as_bytes())?;
                code.push_str(&source_mapping_url_comment(destname));
            }
            Err(err) => {
                warn!(
                    file = %filename.display(),
                    error = %err,
                    "could not parse source map, writing code without it"
                );
            }
        }
    }

    fs.write(destname, code.as_bytes())?;
    info!(path = %relative_path(&config.root, destname), "write");

    Ok(())
}

/// Run every plugin's `on_done` hook for `result`, sequentially in plugin
/// order.
pub(crate) async fn run_done_hooks(config: &ResolvedConfig, result: &BuildResult) -> Result<()> {
    for plugin in &config.plugins {
        let Some(hook) = plugin.done_hook() else {
            continue;
        };
        debug!(plugin = %plugin.name(), file = %result.filename.display(), "running on_done hook");
        hook(result.clone())
            .await
            .map_err(|err| hook_error(plugin.name(), "on_done", err))?;
    }
    Ok(())
}
