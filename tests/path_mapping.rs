use std::error::Error;
use std::path::{Path, PathBuf};

use filemill::config::resolve_config;
use filemill::paths::{destination_for, files_for, globs_for, relative_path, slash};
use filemill_test_utils::builders::ProjectBuilder;
use filemill_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn sample_project() -> anyhow::Result<ProjectBuilder> {
    ProjectBuilder::new()?
        .file("input/main.ts", "export const main = 1\n")?
        .file("input/nested/util.tsx", "export const util = 2\n")?
        .file("input/data.json", "{}\n")?
        .file("input/README.md", "# docs\n")?
        .file("extra.ts", "export const extra = 3\n")?
        .file("foo.ts", "export const foo = 4\n")
}

#[tokio::test]
async fn single_include_root_drops_its_segment() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"]).output("output")).await?;

    let dest = destination_for(&config, &project.path("input/main.ts"));
    assert_eq!(dest, Some(project.path("output/main.js")));

    let nested = destination_for(&config, &project.path("input/nested/util.tsx"));
    assert_eq!(nested, Some(project.path("output/nested/util.js")));

    Ok(())
}

#[tokio::test]
async fn multiple_include_roots_keep_their_segments() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input", "extra.ts"]).output("output")).await?;

    assert_eq!(
        destination_for(&config, &project.path("input/main.ts")),
        Some(project.path("output/input/main.js"))
    );
    assert_eq!(
        destination_for(&config, &project.path("extra.ts")),
        Some(project.path("output/extra.js"))
    );

    Ok(())
}

#[tokio::test]
async fn destination_is_stable_across_calls() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"]).output("output")).await?;
    let file = project.path("input/nested/util.tsx");

    assert_eq!(destination_for(&config, &file), destination_for(&config, &file));
    Ok(())
}

#[tokio::test]
async fn non_source_files_keep_their_extension() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"]).output("output")).await?;

    assert_eq!(
        destination_for(&config, &project.path("input/data.json")),
        Some(project.path("output/data.json"))
    );
    Ok(())
}

#[tokio::test]
async fn no_output_means_no_destination() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"])).await?;

    assert_eq!(destination_for(&config, &project.path("input/main.ts")), None);
    assert_eq!(config.experimental().input_to_output(&project.path("input/main.ts")), None);
    Ok(())
}

#[tokio::test]
async fn globs_cover_directories_files_extensionless_and_patterns() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"])).await?;
    let root = slash(project.root());

    let include: Vec<String> = ["input", "extra.ts", "foo", "missing", "input/**/*.tsx"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let globs = globs_for(&config, &include);
    assert_eq!(
        globs,
        vec![
            format!("{root}/input/**/*"),
            format!("{root}/extra.ts"),
            format!("{root}/foo.ts"),
            format!("{root}/input/**/*.tsx"),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn files_only_include_allowed_extensions() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input", "extra.ts"])).await?;

    let files = config.experimental().include_to_files()?;
    let expected: Vec<PathBuf> = vec![
        project.path("input/main.ts"),
        project.path("input/nested/util.tsx"),
        project.path("extra.ts"),
    ];
    assert_eq!(files, expected);

    for file in &files {
        assert!(config.is_source_extension(file), "{} slipped through", file.display());
    }

    Ok(())
}

#[tokio::test]
async fn overlapping_includes_are_deduplicated() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["input"])).await?;

    let include: Vec<String> = vec!["input".into(), "input/main.ts".into(), "input/**/*.ts".into()];
    let files = files_for(&config, &include)?;

    assert_eq!(
        files,
        vec![project.path("input/main.ts"), project.path("input/nested/util.tsx")]
    );
    Ok(())
}

#[tokio::test]
async fn missing_include_contributes_nothing() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let config = resolve_config(project.config(["does-not-exist"])).await?;

    assert!(config.experimental().include_to_globs().is_empty());
    assert!(config.experimental().include_to_files()?.is_empty());
    Ok(())
}

#[test]
fn relative_paths_walk_up_from_the_directory() {
    assert_eq!(
        relative_path(Path::new("/proj/dist/b"), Path::new("/proj/src/b/c.tsx")),
        "../../src/b/c.tsx"
    );
    assert_eq!(
        relative_path(Path::new("/proj/./dist"), Path::new("/proj/dist/x/../main.js")),
        "main.js"
    );
    assert_eq!(relative_path(Path::new("/proj"), Path::new("/proj")), "");
}
