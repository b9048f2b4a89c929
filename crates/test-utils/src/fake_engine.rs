use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use filemill::config::TransformOptions;
use filemill::exec::{EngineFuture, EngineOutput, TransformEngine};

/// One recorded engine invocation.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub filename: PathBuf,
    pub code: String,
    pub options: TransformOptions,
}

/// A fake engine that:
/// - records every file it was asked to transform, with the options it saw
/// - prefixes the code with a marker comment
/// - optionally emits a fixed source map, warnings, or fails for one file.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    map: Option<String>,
    warnings: Vec<String>,
    fail_on: Option<PathBuf>,
}

pub const FAKE_ENGINE_MARKER: &str = "/* fake-engine */\n";

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `map` as the source map for every file.
    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Fail when asked to transform `filename`.
    pub fn failing_on(mut self, filename: impl Into<PathBuf>) -> Self {
        self.fail_on = Some(filename.into());
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TransformEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn transform<'a>(
        &'a self,
        code: &'a str,
        filename: &'a Path,
        options: &'a TransformOptions,
    ) -> EngineFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(EngineCall {
                filename: filename.to_path_buf(),
                code: code.to_string(),
                options: options.clone(),
            });

            if self.fail_on.as_deref() == Some(filename) {
                return Err(anyhow!("fake engine rejected {}", filename.display()));
            }

            Ok(EngineOutput {
                code: format!("{FAKE_ENGINE_MARKER}{code}"),
                map: self.map.clone(),
                warnings: self.warnings.clone(),
            })
        })
    }
}
