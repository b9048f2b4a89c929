// src/plugin/builtin.rs

//! The transform plugin every session starts with.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::config::TransformOptions;
use crate::exec::TransformEngine;
use crate::paths::extension_of;
use crate::plugin::{Plugin, TransformArgs, TransformResult};

pub const TRANSFORM_PLUGIN_NAME: &str = ":transform";

/// Node version the engine targets unless the caller says otherwise.
const DEFAULT_NODE_TARGET: &str = "14";

/// Plugin that hands every source file to `engine`.
///
/// During negotiation it fills the engine defaults the caller left out
/// (`env.targets.node`, `module.type`). Per file it picks a parser from the
/// extension unless `jsc.parser` is set explicitly.
pub fn transform_plugin(engine: Arc<dyn TransformEngine>) -> Plugin {
    Plugin::new(TRANSFORM_PLUGIN_NAME)
        .on_config_resolved(|_config, mut options: TransformOptions| async move {
            options.set_default_at(&["env", "targets", "node"], json!(DEFAULT_NODE_TARGET));
            options.set_default_at(&["module", "type"], json!("commonjs"));
            anyhow::Ok(Some(options))
        })
        .on_transform(move |args: TransformArgs| {
            let engine = Arc::clone(&engine);
            async move {
                let mut options = args.config.transform_options.clone();
                options.set_default_at(&["jsc", "parser"], parser_for(&args.filename));

                let output = engine
                    .transform(&args.code, &args.filename, &options)
                    .await?;

                if !output.warnings.is_empty() {
                    warn!(
                        engine = %engine.name(),
                        file = %args.filename.display(),
                        "{}",
                        output.warnings.join("\n")
                    );
                }

                anyhow::Ok(TransformResult::Structured {
                    code: output.code,
                    map: output.map,
                })
            }
        })
}

/// Parser settings derived from the file extension.
pub fn parser_for(filename: &Path) -> Value {
    match extension_of(filename).as_deref() {
        Some(".ts") => json!({ "syntax": "typescript", "tsx": false }),
        Some(".tsx") => json!({ "syntax": "typescript", "tsx": true }),
        Some(".jsx") => json!({ "syntax": "ecmascript", "jsx": true }),
        _ => json!({ "syntax": "ecmascript", "jsx": false }),
    }
}
