// src/watch/handler.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::engine::build::{build_file, run_done_hooks};
use crate::engine::BuildResult;
use crate::errors::{FilemillError, Result};
use crate::paths::{destination_for, is_declaration_file, normalize_path, relative_path};
use crate::watch::{WatchEvent, WatchEventKind};

/// How the watcher treats a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Transformed through the pipeline.
    Source,
    /// Copied verbatim.
    Static,
    Other,
}

impl FileClass {
    pub fn of(config: &ResolvedConfig, path: &Path) -> Self {
        if config.is_source_extension(path) && !is_declaration_file(path) {
            FileClass::Source
        } else if config.is_static_extension(path) {
            FileClass::Static
        } else {
            FileClass::Other
        }
    }
}

/// Perform the build, copy or delete action for one watch event.
///
/// `on_done` hooks run only when an action actually happened.
pub async fn handle_event(config: &Arc<ResolvedConfig>, event: &WatchEvent) -> Result<()> {
    let path = event.path.as_path();
    let class = FileClass::of(config, path);

    match event.kind {
        WatchEventKind::Add | WatchEventKind::Change => match class {
            FileClass::Source => {
                build_file(config, path).await?;
            }
            FileClass::Static => {
                if let Some(destname) = destination_for(config, path) {
                    copy_static(config, path, &destname)?;
                    run_done_hooks(config, &BuildResult::written(path, destname)).await?;
                }
            }
            FileClass::Other => {
                debug!(path = %path.display(), "no action for file");
            }
        },
        WatchEventKind::AddDir => {}
        WatchEventKind::Unlink => {
            let Some(destname) = destination_for(config, path) else {
                return Ok(());
            };
            if !config.fs.is_file(&destname) {
                return Ok(());
            }

            config.fs.remove_file(&destname)?;
            info!(path = %relative_path(&config.root, &destname), "remove");

            if class != FileClass::Other {
                run_done_hooks(config, &BuildResult::written(path, destname)).await?;
            }
        }
        WatchEventKind::UnlinkDir => {
            if let Some(destname) = destination_for(config, path) {
                if config.fs.is_dir(&destname) {
                    config.fs.remove_dir_all(&destname)?;
                    info!(path = %relative_path(&config.root, &destname), "remove dir");
                }
            }
        }
    }

    Ok(())
}

fn copy_static(config: &ResolvedConfig, path: &Path, destname: &Path) -> Result<()> {
    if destname == normalize_path(path) {
        return Err(FilemillError::SameInputOutput {
            filename: path.to_path_buf(),
        });
    }

    if let Some(parent) = destname.parent() {
        config.fs.create_dir_all(parent)?;
    }
    config.fs.copy(path, destname)?;
    info!(path = %relative_path(&config.root, destname), "copy");
    Ok(())
}
