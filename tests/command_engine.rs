#![cfg(unix)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use filemill::config::{resolve_config, Configuration, TransformOptions};
use filemill::engine::transform_one;
use filemill::errors::FilemillError;
use filemill::exec::command::OPTIONS_ENV_VAR;
use filemill::exec::{CommandEngine, TransformEngine};
use filemill::fs::mock::MockFileSystem;
use filemill_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> anyhow::Result<CommandEngine> {
    CommandEngine::new(vec!["sh".into(), "-c".into(), script.into()])
}

#[tokio::test]
async fn stdout_becomes_code_and_stderr_lines_become_warnings() -> TestResult {
    init_tracing();
    let engine = sh("cat; echo 'first warning' >&2; echo >&2; echo second >&2")?;

    let output = engine
        .transform(
            "const a = 1;\n",
            Path::new("/proj/src/a.ts"),
            &TransformOptions::new(),
        )
        .await?;

    assert_eq!(output.code, "const a = 1;\n");
    assert_eq!(output.map, None);
    assert_eq!(output.warnings, vec!["first warning", "second"]);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_transform_error() -> TestResult {
    init_tracing();
    let engine = sh("cat > /dev/null; echo 'unexpected token' >&2; exit 3")?;

    let err = engine
        .transform("nope", Path::new("/proj/src/bad.ts"), &TransformOptions::new())
        .await
        .expect_err("exit 3 must fail");

    match err.downcast::<FilemillError>()? {
        FilemillError::Transform { filename, message } => {
            assert_eq!(filename, Path::new("/proj/src/bad.ts"));
            assert_eq!(message, "unexpected token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn silent_failure_names_the_program() -> TestResult {
    init_tracing();
    let engine = sh("exit 1")?;

    let err = engine
        .transform("", Path::new("/proj/src/a.ts"), &TransformOptions::new())
        .await
        .expect_err("exit 1 must fail");

    let message = err.to_string();
    assert!(message.contains("'sh' exited with"), "{message}");
    Ok(())
}

#[tokio::test]
async fn engine_errors_keep_their_shape_through_the_pipeline() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/a.ts", "const a = 1;\n");
    let engine = sh("cat > /dev/null; echo broken >&2; exit 2")?;

    let config = resolve_config(
        Configuration::new(["src"])
            .root("/proj")
            .engine(Arc::new(engine))
            .file_system(Arc::new(fs)),
    )
    .await?;

    let err = transform_one(&config, Path::new("/proj/src/a.ts"))
        .await
        .expect_err("engine failure propagates");
    assert!(
        matches!(&err, FilemillError::Transform { message, .. } if message == "broken"),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn negotiated_options_reach_the_command() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/view.tsx", "export const view = 1;\n");
    let engine = sh(&format!("cat > /dev/null; printf '%s' \"${OPTIONS_ENV_VAR}\""))?;

    let config = resolve_config(
        Configuration::new(["src"])
            .root("/proj")
            .engine(Arc::new(engine))
            .transform_options(TransformOptions::new().with("sourceMaps", true))
            .file_system(Arc::new(fs)),
    )
    .await?;

    let output = transform_one(&config, Path::new("/proj/src/view.tsx")).await?;
    let seen: Value = serde_json::from_str(&output.code)?;

    assert_eq!(seen["sourceMaps"], json!(true));
    assert_eq!(seen["env"]["targets"]["node"], json!("14"));
    assert_eq!(seen["module"]["type"], json!("commonjs"));
    assert_eq!(seen["jsc"]["parser"], json!({ "syntax": "typescript", "tsx": true }));
    Ok(())
}

#[test]
fn filename_placeholder_is_substituted() -> TestResult {
    let engine = CommandEngine::new(vec![
        "esbuild".into(),
        "--loader=ts".into(),
        "--sourcefile={filename}".into(),
        "{filename}".into(),
    ])?;

    assert_eq!(engine.program(), "esbuild");
    assert_eq!(
        engine.args_for(Path::new("/proj/src/main.ts")),
        vec![
            "--loader=ts",
            "--sourcefile=/proj/src/main.ts",
            "/proj/src/main.ts",
        ]
    );
    Ok(())
}

#[test]
fn empty_command_is_rejected() {
    assert!(CommandEngine::new(Vec::new()).is_err());
    assert!(CommandEngine::new(vec!["  ".into()]).is_err());
}
