// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::TransformOptions;
use crate::errors::FilemillError;
use crate::exec::{EngineFuture, EngineOutput, TransformEngine};

/// Placeholder in command arguments replaced by the source path.
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

/// Environment variable holding the per-file transform options as JSON.
pub const OPTIONS_ENV_VAR: &str = "FILEMILL_TRANSFORM_OPTIONS";

/// Engine that runs an external transpiler per file.
///
/// Source code is written to the child's stdin and the transformed code is
/// read from its stdout. The negotiated options for the file (engine
/// defaults and `jsc.parser` included) are passed as JSON in
/// [`OPTIONS_ENV_VAR`]. Each non-empty stderr line becomes a warning; a
/// non-zero exit status fails the file with stderr as the message.
///
/// `["esbuild", "--loader=ts", "--sourcefile={filename}"]` runs
/// `esbuild --loader=ts --sourcefile=/abs/src/main.ts`.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Build from `[program, args...]`.
    pub fn new(command: Vec<String>) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| anyhow!("engine command must not be empty"))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with the placeholder substituted for `filename`.
    pub fn args_for(&self, filename: &Path) -> Vec<String> {
        let filename = filename.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(FILENAME_PLACEHOLDER, &filename))
            .collect()
    }

    async fn run(
        &self,
        code: &str,
        filename: &Path,
        options: &TransformOptions,
    ) -> Result<EngineOutput> {
        let args = self.args_for(filename);
        let options = serde_json::to_string(options).context("serializing transform options")?;
        debug!(program = %self.program, ?args, file = %filename.display(), "running engine command");

        let mut child = Command::new(&self.program)
            .args(&args)
            .env(OPTIONS_ENV_VAR, options)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning engine command '{}'", self.program))?;

        // Feed stdin from a separate task so a chatty child can't deadlock
        // on a full stdout pipe while we are still writing.
        let stdin_task = child.stdin.take().map(|mut stdin| {
            let input = code.to_string();
            tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await
            })
        });

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for engine command '{}'", self.program))?;

        if let Some(task) = stdin_task {
            // A child that exits without reading all input closes the pipe;
            // its exit status is what matters.
            if let Ok(Err(err)) = task.await {
                debug!(program = %self.program, error = %err, "engine stdin closed early");
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = match stderr.trim() {
                "" => format!("'{}' exited with {}", self.program, output.status),
                trimmed => trimmed.to_string(),
            };
            return Err(FilemillError::Transform {
                filename: filename.to_path_buf(),
                message,
            }
            .into());
        }

        let code = String::from_utf8(output.stdout)
            .with_context(|| format!("engine output for {} is not UTF-8", filename.display()))?;

        let warnings = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(EngineOutput {
            code,
            map: None,
            warnings,
        })
    }
}

impl TransformEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn transform<'a>(
        &'a self,
        code: &'a str,
        filename: &'a Path,
        options: &'a TransformOptions,
    ) -> EngineFuture<'a> {
        Box::pin(self.run(code, filename, options))
    }
}
