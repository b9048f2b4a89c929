use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use filemill::config::{load_and_validate, load_from_path, resolve_config, validate_config};
use filemill::errors::FilemillError;
use filemill::paths::destination_for;
use filemill_test_utils::builders::ProjectBuilder;
use filemill_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn demo_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[tokio::test]
async fn basic_demo_resolves_to_its_sources() -> TestResult {
    init_tracing();
    let dir = demo_dir("basic");
    let file = load_and_validate(dir.join("filemill.toml"))?;

    assert_eq!(file.include, vec!["src"]);
    assert_eq!(file.transform_options.get("sourceMaps"), Some(&json!(true)));
    assert!(file.engine.is_none());

    let config = resolve_config(file.into_configuration(&dir)?).await?;
    assert_eq!(config.root, dir);
    assert_eq!(config.output, Some(dir.join("dist")));
    assert_eq!(config.watch.change_throttle, Duration::from_millis(50));
    assert!(!config.watch.ignore_initial);

    let files = config.experimental().include_to_files()?;
    assert_eq!(files, vec![dir.join("src/lib/greet.ts"), dir.join("src/main.ts")]);
    assert_eq!(
        destination_for(&config, &dir.join("src/lib/greet.ts")),
        Some(dir.join("dist/lib/greet.js"))
    );
    Ok(())
}

#[tokio::test]
async fn command_engine_demo_keeps_root_segments() -> TestResult {
    init_tracing();
    let dir = demo_dir("command-engine");
    let file = load_and_validate(dir.join("filemill.toml"))?;

    let engine = file.engine.as_ref().expect("engine section");
    assert_eq!(engine.command[0], "esbuild");
    assert!(file.watch.ignore_initial);
    assert_eq!(file.watch.change_throttle_ms, 100);

    let config = resolve_config(file.into_configuration(&dir)?).await?;
    assert_eq!(config.transform_options.get("target"), Some(&json!("es2020")));
    assert_eq!(config.transform_options.get("format"), Some(&json!("cjs")));

    let files = config.experimental().include_to_files()?;
    assert_eq!(files, vec![dir.join("src/index.ts"), dir.join("extra.ts")]);
    assert_eq!(
        destination_for(&config, &dir.join("src/index.ts")),
        Some(dir.join("build/src/index.js"))
    );
    assert_eq!(
        destination_for(&config, &dir.join("extra.ts")),
        Some(dir.join("build/extra.js"))
    );
    Ok(())
}

#[test]
fn missing_sections_take_defaults() -> TestResult {
    init_tracing();
    let project = ProjectBuilder::new()?.file("filemill.toml", "include = [\"lib\"]\n")?;

    let file = load_and_validate(project.path("filemill.toml"))?;
    assert_eq!(file.root, None);
    assert_eq!(file.output, None);
    assert!(file.transform_options.is_empty());
    assert_eq!(file.watch.change_throttle_ms, 50);

    let config = file.into_configuration(project.root())?;
    assert_eq!(config.root.as_deref(), Some(project.root()));
    assert!(config.engine.is_none());
    Ok(())
}

#[test]
fn invalid_files_are_rejected() -> TestResult {
    init_tracing();
    let cases = [
        ("no-include.toml", "output = \"dist\"\n"),
        ("blank-include.toml", "include = [\"src\", \"  \"]\n"),
        ("empty-engine.toml", "include = [\"src\"]\n[engine]\ncommand = []\n"),
        ("output-root.toml", "include = [\"src\"]\noutput = \"./\"\n"),
    ];

    let mut project = ProjectBuilder::new()?;
    for (name, contents) in cases {
        project = project.file(name, contents)?;
    }

    for (name, _) in cases {
        let file = load_from_path(project.path(name))?;
        match validate_config(&file) {
            Err(FilemillError::ConfigError(_)) => {}
            other => panic!("{name}: expected a config error, got {other:?}"),
        }
        assert!(load_and_validate(project.path(name)).is_err(), "{name}");
    }
    Ok(())
}

#[test]
fn malformed_toml_is_an_error() -> TestResult {
    init_tracing();
    let project = ProjectBuilder::new()?.file("filemill.toml", "include = [\"src\"\n")?;

    assert!(load_from_path(project.path("filemill.toml")).is_err());
    Ok(())
}
