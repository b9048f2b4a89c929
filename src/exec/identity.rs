// src/exec/identity.rs

use std::path::Path;

use crate::config::TransformOptions;
use crate::engine::sourcemap::SourceMap;
use crate::exec::{EngineFuture, EngineOutput, TransformEngine};

/// Engine that passes code through untouched.
///
/// When `sourceMaps` is `true` in the options it also emits a line-by-line
/// identity map, so the output tree carries usable maps even without a real
/// transpiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEngine;

impl TransformEngine for IdentityEngine {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform<'a>(
        &'a self,
        code: &'a str,
        filename: &'a Path,
        options: &'a TransformOptions,
    ) -> EngineFuture<'a> {
        Box::pin(async move {
            let map = if options.get_bool("sourceMaps") {
                Some(SourceMap::identity(code, filename).to_json()?)
            } else {
                None
            };

            Ok(EngineOutput {
                code: code.to_string(),
                map,
                warnings: Vec::new(),
            })
        })
    }
}
