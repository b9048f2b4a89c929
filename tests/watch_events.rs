use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use filemill::config::WatchOptions;
use filemill::errors::FilemillError;
use filemill::plugin::builtin::TRANSFORM_PLUGIN_NAME;
use filemill::watch::{watch, WatchEventKind};
use filemill_test_utils::builders::{write_file, ProjectBuilder};
use filemill_test_utils::fake_engine::FakeEngine;
use filemill_test_utils::recorder::{HookCall, HookRecorder};
use filemill_test_utils::{init_tracing, settle, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn sample_project() -> anyhow::Result<ProjectBuilder> {
    ProjectBuilder::new()?.file("src/main.ts", "export const main = 1;\n")
}

fn count_watch(recorder: &HookRecorder, kind: WatchEventKind) -> usize {
    recorder
        .watch_events()
        .iter()
        .filter(|(k, _)| *k == kind)
        .count()
}

/// Layout:
/// - src/main.ts exists before the watcher starts
///
/// Expect one `add` (initial scan) followed by one `change` for a single
/// rewrite, each followed by a rebuild.
#[tokio::test]
async fn initial_add_then_change_rebuilds() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    assert_eq!(project.read("dist/main.js")?, "export const main = 1;\n");

    settle().await;
    write_file(&project.path("src/main.ts"), "export const main = 2;\n")?;

    with_timeout(recorder.wait_for_done(2)).await;
    assert_eq!(project.read("dist/main.js")?, "export const main = 2;\n");

    // Give stray notifications a chance to show up before counting.
    settle().await;
    assert_eq!(
        recorder.watch_events(),
        vec![
            (WatchEventKind::Add, project.path("src/main.ts")),
            (WatchEventKind::Change, project.path("src/main.ts")),
        ]
    );

    // on_watch runs before the action it announces.
    let calls = recorder.calls();
    let first_watch = calls
        .iter()
        .position(|c| matches!(c, HookCall::Watch { .. }))
        .expect("watch hook ran");
    let first_done = calls
        .iter()
        .position(|c| matches!(c, HookCall::Done { .. }))
        .expect("done hook ran");
    assert!(first_watch < first_done);

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn deleting_a_source_removes_its_output() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    assert!(project.exists("dist/main.js"));

    settle().await;
    std::fs::remove_file(project.path("src/main.ts"))?;

    with_timeout(recorder.wait_for_done(2)).await;
    assert!(!project.exists("dist/main.js"));
    assert_eq!(count_watch(&recorder, WatchEventKind::Unlink), 1);

    let done = recorder.done_results();
    assert_eq!(done[1].filename, project.path("src/main.ts"));
    assert_eq!(done[1].destname(), Some(project.path("dist/main.js").as_path()));

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn static_files_are_copied_verbatim() -> TestResult {
    init_tracing();
    let project = ProjectBuilder::new()?
        .file("src/package.json", "{ \"name\": \"demo\" }\n")?
        .file("src/notes.txt", "ignored\n")?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    assert_eq!(project.read("dist/package.json")?, "{ \"name\": \"demo\" }\n");

    // Files that are neither source nor static are announced but not acted on.
    settle().await;
    assert_eq!(count_watch(&recorder, WatchEventKind::Add), 2);
    assert_eq!(recorder.done_results().len(), 1);
    assert!(!project.exists("dist/notes.txt"));

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn ignore_initial_reports_only_new_files() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .watch_options(WatchOptions {
                ignore_initial: true,
                ..WatchOptions::default()
            })
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    settle().await;
    assert!(recorder.watch_events().is_empty());
    assert!(!project.exists("dist/main.js"));

    write_file(&project.path("src/extra.ts"), "export const extra = 1;\n")?;

    with_timeout(recorder.wait_for_done(1)).await;
    assert_eq!(
        recorder.watch_events()[0],
        (WatchEventKind::Add, project.path("src/extra.ts"))
    );
    assert!(project.exists("dist/extra.js"));
    assert!(!project.exists("dist/main.js"));

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn new_directories_are_announced_and_built() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    settle().await;

    write_file(&project.path("src/lib/util.ts"), "export const util = 1;\n")?;

    with_timeout(recorder.wait_for_done(2)).await;
    assert!(project.exists("dist/lib/util.js"));
    assert!(
        recorder
            .watch_events()
            .contains(&(WatchEventKind::AddDir, project.path("src/lib")))
    );

    watcher.close();
    Ok(())
}

/// Layout:
/// - src/main.ts
/// - src/lib/util.ts
///
/// Removing src/lib removes the whole mapped dist/lib directory.
#[tokio::test]
async fn deleting_a_directory_removes_its_output_directory() -> TestResult {
    init_tracing();
    let project = sample_project()?.file("src/lib/util.ts", "export const util = 1;\n")?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(2)).await;
    assert!(project.exists("dist/lib/util.js"));

    settle().await;
    std::fs::remove_dir_all(project.path("src/lib"))?;

    let lib = project.path("src/lib");
    with_timeout(recorder.wait_until(|calls| {
        calls.iter().any(|c| {
            matches!(c, HookCall::Watch { kind: WatchEventKind::UnlinkDir, path, .. } if *path == lib)
        })
    }))
    .await;
    with_timeout(async {
        while project.exists("dist/lib") {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(project.exists("dist/main.js"));
    assert_eq!(count_watch(&recorder, WatchEventKind::Unlink), 1);

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn declaration_files_are_not_built() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    settle().await;

    write_file(&project.path("src/types.d.ts"), "export type Id = string;\n")?;

    let types = project.path("src/types.d.ts");
    with_timeout(recorder.wait_until(|calls| {
        calls.iter().any(|c| {
            matches!(c, HookCall::Watch { kind: WatchEventKind::Add, path, .. } if *path == types)
        })
    }))
    .await;
    settle().await;

    assert_eq!(recorder.done_results().len(), 1);
    assert!(!project.exists("dist/types.d.js"));
    assert!(!project.exists("dist/types.d.ts"));

    watcher.close();
    Ok(())
}

#[tokio::test]
async fn closed_watcher_reports_nothing_more() -> TestResult {
    init_tracing();
    let project = sample_project()?;
    let recorder = HookRecorder::new();

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    with_timeout(recorder.wait_for_done(1)).await;
    watcher.close();
    watcher.close();

    let seen = recorder.calls().len();
    write_file(&project.path("src/late.ts"), "export const late = 1;\n")?;
    settle().await;

    assert_eq!(recorder.calls().len(), seen);
    assert!(!project.exists("dist/late.js"));

    // Every sender is gone once dispatch stopped and in-flight work finished.
    assert!(with_timeout(watcher.next_error()).await.is_none());
    Ok(())
}

#[tokio::test]
async fn handler_failures_surface_without_stopping_the_watcher() -> TestResult {
    init_tracing();
    let project = sample_project()?.file("src/bad.ts", "nope\n")?;
    let recorder = HookRecorder::new();
    let engine = FakeEngine::new().failing_on(project.path("src/bad.ts"));

    let mut watcher = watch(
        project
            .config(["src"])
            .output("dist")
            .engine(Arc::new(engine))
            .watch_options(WatchOptions {
                ignore_initial: false,
                change_throttle: Duration::from_millis(20),
            })
            .plugin(recorder.plugin("rec")),
    )
    .await?;

    let err = with_timeout(watcher.next_error())
        .await
        .expect("handler error is reported");
    match err {
        FilemillError::Hook { plugin, hook, .. } => {
            assert_eq!(plugin, TRANSFORM_PLUGIN_NAME);
            assert_eq!(hook, "transform");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The healthy file still builds, and later edits are still picked up.
    with_timeout(recorder.wait_for_done(1)).await;
    assert!(project.exists("dist/main.js"));
    assert!(!project.exists("dist/bad.js"));

    settle().await;
    write_file(&project.path("src/main.ts"), "export const main = 3;\n")?;
    with_timeout(recorder.wait_for_done(2)).await;

    watcher.close();
    Ok(())
}
