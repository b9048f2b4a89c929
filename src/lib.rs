// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod plugin;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::ResolvedConfig;

pub use crate::config::{resolve_config, Configuration, TransformOptions, WatchOptions};
pub use crate::engine::{build, build_file, transform_one, BuildOutput, BuildResult};
pub use crate::errors::FilemillError;
pub use crate::plugin::{DoneSignal, Plugin, TransformArgs, TransformResult};
pub use crate::watch::{watch, WatchEventKind, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - config resolution (plugins, option negotiation)
/// - a one-shot build, or a watcher running until Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let file = load_and_validate(&args.config)?;
    let configuration = file.into_configuration(&config_root_dir(&args.config))?;
    let resolved = resolve_config(configuration)
        .await
        .context("resolving configuration")?;

    if args.dry_run {
        print_dry_run(&resolved)?;
        return Ok(());
    }

    if !args.watch {
        let results = engine::build_resolved(&resolved).await?;
        info!(files = results.len(), "build finished");
        return Ok(());
    }

    let mut watcher = watch::start_watcher(resolved)?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl+C")?;
                info!("shutdown requested, closing watcher");
                break;
            }
            Some(err) = watcher.next_error() => {
                // Already logged by the watcher; keep running.
                debug!(error = %err, "watch error observed");
            }
        }
    }

    watcher.close();
    Ok(())
}

/// Directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Print the resolved configuration and the file mapping without building.
fn print_dry_run(config: &ResolvedConfig) -> Result<()> {
    println!("filemill dry-run");
    println!("  root = {}", config.root.display());
    match &config.output {
        Some(output) => println!("  output = {}", output.display()),
        None => println!("  output = (in memory)"),
    }
    println!(
        "  plugins = {:?}",
        config.plugins.iter().map(Plugin::name).collect::<Vec<_>>()
    );
    println!("  transform_options = {}", serde_json::to_string(&config.transform_options)?);
    println!();

    let experimental = config.experimental();
    let globs = experimental.include_to_globs();
    println!("globs ({}):", globs.len());
    for glob in &globs {
        println!("  - {glob}");
    }

    let files = experimental.include_to_files()?;
    if files.is_empty() {
        warn!("include entries matched no files");
    }
    println!("files ({}):", files.len());
    for file in &files {
        match experimental.input_to_output(file) {
            Some(dest) => println!("  {} -> {}", file.display(), dest.display()),
            None => println!("  {}", file.display()),
        }
    }

    debug!("dry-run complete (nothing built)");
    Ok(())
}
