// tests/supervisor_generations.rs

mod common;
use crate::common::{
    init_tracing, settle, wait_until, with_timeout, Harness, RecordingInspection, TestWorkspace,
    WatchFileBuilder,
};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use patrol::engine::{Outcome, Supervisor, SupervisorOptions, WatchPointIdentity};
use patrol::errors::PatrolError;
use patrol::types::{FileEvent, FileEventKind};
use patrol::watch::{ManualEventSource, SourceOp};

type TestResult = Result<(), Box<dyn Error>>;

fn continuous() -> SupervisorOptions {
    SupervisorOptions::default()
}

#[test]
fn test_supervisor_future_is_send() {
    fn assert_send<T: Send>(_: &T) {}

    let supervisor = Supervisor::new(
        ManualEventSource::new(),
        "patrol.yaml",
        ".",
        Arc::new(RecordingInspection::new()),
        SupervisorOptions::default(),
    );
    let run = supervisor.run(CancellationToken::new());
    assert_send(&run);
}

#[tokio::test]
async fn test_one_handle_per_existing_source() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.write_watch_file(
        WatchFileBuilder::new()
            .watch("a.txt", "A")
            .watch("missing.txt", "B")
            .build(),
    );

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    let status = h.wait_for_generation(1).await;

    assert_eq!(
        status.watch_points,
        vec![WatchPointIdentity {
            name: "A".to_string(),
            path: h.ws.path("a.txt"),
        }]
    );
    assert_eq!(h.source.active(h.ws.path("a.txt")), 1);
    assert_eq!(h.source.active(h.ws.path("missing.txt")), 0);

    // Initialized → one inspection for A, none for B.
    h.wait_for_calls("A", 1).await;
    settle().await;
    assert_eq!(h.inspection.count("B"), 0);

    assert_eq!(h.stop().await?, Outcome::Shutdown);
    Ok(())
}

#[tokio::test]
async fn test_swap_closes_old_handle_before_opening_new() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let a = ws.touch("a.txt");
    let b = ws.touch("b.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("A", 1).await;

    h.change_watch_file(WatchFileBuilder::new().watch("b.txt", "B").build());
    let status = h.wait_for_generation(2).await;
    assert_eq!(status.watch_points.len(), 1);
    assert_eq!(status.watch_points[0].name, "B");
    h.wait_for_calls("B", 1).await;

    let journal = h.source.journal();
    let closed_a = journal
        .iter()
        .position(|op| *op == SourceOp::Closed(a.clone()))
        .expect("a.txt handle never closed");
    let opened_b = journal
        .iter()
        .position(|op| *op == SourceOp::Subscribed(b.clone()))
        .expect("b.txt handle never opened");
    assert!(closed_a < opened_b, "journal: {journal:?}");

    // Nothing listens to a.txt anymore.
    assert_eq!(h.source.emit(&a, FileEventKind::Modified), 0);
    settle().await;
    assert_eq!(h.inspection.count("A"), 1);

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_retire_waits_for_in_flight_inspection() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    let config = WatchFileBuilder::new().watch("a.txt", "A").build();
    ws.write_watch_file(&config);

    let inspection = RecordingInspection::new().with_delay(Duration::from_millis(200));
    let mut h = Harness::start(ws, inspection, continuous());
    h.wait_for_generation(1).await;

    // First inspection of A is now sleeping; reload right away.
    h.wait_for_calls("A", 1).await;
    h.change_watch_file(&config);
    h.wait_for_generation(2).await;
    h.wait_for_calls("A", 2).await;

    // Let the second one finish as well before looking.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!h.inspection.overlapped(), "two generations inspected A at once");

    h.stop().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_stale_inspection_while_new_watch_file_loads() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let old = ws.touch("old.txt");
    ws.touch("new.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("old.txt", "OLD").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("OLD", 1).await;
    settle().await;

    // Large enough that parsing takes a while.
    let payload: Vec<String> = (0..200_000).map(|i| i.to_string()).collect();
    let heavy = format!(
        "- source: new.txt\n  name: NEW\n  payload: [{}]\n",
        payload.join(", ")
    );
    h.change_watch_file(heavy);

    // The old generation still holds its handle while the file is parsed.
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.source.emit(&old, FileEventKind::Modified);

    tokio::time::timeout(
        Duration::from_secs(20),
        h.status.wait_for(|s| s.generation >= 2),
    )
    .await??;
    h.wait_for_calls("NEW", 1).await;

    assert_eq!(
        h.inspection.count("OLD"),
        1,
        "old generation inspected after the watch file event"
    );
    assert_eq!(h.source.active(&old), 0);

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_bad_edit_resumes_paused_generation() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let a = ws.touch("a.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("A", 1).await;

    h.change_watch_file("{ broken: [yaml\n");
    settle().await;
    h.source.emit(&a, FileEventKind::Modified);

    h.wait_for_calls("A", 2).await;
    assert_eq!(h.current().generation, 1);

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_reload_of_unchanged_file_keeps_identities() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.touch("b.txt");
    let config = WatchFileBuilder::new()
        .watch("a.txt", "A")
        .watch("b.txt", "B")
        .build();
    ws.write_watch_file(&config);

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    let first = h.wait_for_generation(1).await;

    h.change_watch_file(&config);
    let second = h.wait_for_generation(2).await;

    assert_eq!(first.watch_points, second.watch_points);
    assert_eq!(second.generation, 2);
    wait_until("one handle each", || {
        h.source.active(h.ws.path("a.txt")) == 1 && h.source.active(h.ws.path("b.txt")) == 1
    })
    .await;

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_deleting_watch_file_keeps_generation() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("A", 1).await;

    std::fs::remove_file(h.ws.watch_file())?;
    h.source.emit(h.ws.watch_file(), FileEventKind::Deleted);
    settle().await;

    assert_eq!(h.current().generation, 1);
    assert_eq!(h.source.active(h.ws.path("a.txt")), 1);

    // The surviving generation still reacts.
    h.source.emit(h.ws.path("a.txt"), FileEventKind::Modified);
    h.wait_for_calls("A", 2).await;

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_unparsable_edit_keeps_working_generation() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.touch("b.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;

    h.change_watch_file("source: this is a mapping, not a list\n");
    settle().await;
    assert_eq!(h.current().generation, 1);
    assert_eq!(h.source.active(h.ws.path("a.txt")), 1);

    // A fixed edit is picked up as usual.
    h.change_watch_file(WatchFileBuilder::new().watch("b.txt", "B").build());
    let status = h.wait_for_generation(2).await;
    assert_eq!(status.watch_points[0].name, "B");

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_unparsable_first_load_is_fatal() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.write_watch_file("{ not: [a list\n");

    let h = Harness::start(ws, RecordingInspection::new(), continuous());
    let result = with_timeout(h.handle).await?;

    assert!(matches!(result, Err(PatrolError::ConfigParse { .. })));
    assert_eq!(h.source.total_active(), 0);
    Ok(())
}

#[tokio::test]
async fn test_directory_modifications_are_skipped() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let assets = ws.mkdir("assets");
    let nested = ws.mkdir("assets/nested");
    let file = ws.touch("assets/logo.svg");
    ws.write_watch_file(WatchFileBuilder::new().watch("assets", "assets").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("assets", 1).await;

    h.source
        .emit_event(&assets, FileEvent::new(FileEventKind::Modified, &nested, true));
    h.source
        .emit_event(&assets, FileEvent::new(FileEventKind::Modified, &file, false));

    h.wait_for_calls("assets", 2).await;
    settle().await;
    assert_eq!(h.inspection.count("assets"), 2);

    // Directory creation and deletion are still significant.
    h.source
        .emit_event(&assets, FileEvent::new(FileEventKind::Created, &nested, true));
    h.wait_for_calls("assets", 3).await;

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_file_events_each_trigger_an_inspection() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let a = ws.touch("a.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    h.wait_for_calls("A", 1).await;

    for kind in [
        FileEventKind::Modified,
        FileEventKind::Deleted,
        FileEventKind::Created,
    ] {
        h.source.emit_event(&a, FileEvent::new(kind, &a, false));
    }
    h.wait_for_calls("A", 4).await;

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_failing_inspection_is_contained() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    let a = ws.touch("a.txt");
    let b = ws.touch("b.txt");
    let c = ws.touch("c.txt");
    ws.write_watch_file(
        WatchFileBuilder::new()
            .watch("a.txt", "A")
            .watch("b.txt", "B")
            .watch("c.txt", "C")
            .build(),
    );

    let inspection = RecordingInspection::new().fail_for("A").panic_for("B");
    let mut h = Harness::start(ws, inspection, continuous());
    h.wait_for_generation(1).await;
    for name in ["A", "B", "C"] {
        h.wait_for_calls(name, 1).await;
    }

    // Failing and panicking watch points keep being dispatched.
    h.source.emit(&a, FileEventKind::Modified);
    h.source.emit(&b, FileEventKind::Modified);
    h.source.emit(&c, FileEventKind::Modified);
    for name in ["A", "B", "C"] {
        h.wait_for_calls(name, 2).await;
    }

    assert_eq!(h.stop().await?, Outcome::Shutdown);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_is_passed_through() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.write_watch_file(WatchFileBuilder::new().watch("a.txt", "A").build());

    let options = SupervisorOptions {
        dry_run: true,
        ..SupervisorOptions::default()
    };
    let mut h = Harness::start(ws, RecordingInspection::new(), options);
    h.wait_for_generation(1).await;
    h.wait_for_calls("A", 1).await;

    assert!(h.inspection.calls().iter().all(|c| c.dry_run));

    h.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_shutdown_closes_every_subscription() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.touch("b.txt");
    ws.write_watch_file(
        WatchFileBuilder::new()
            .watch("a.txt", "A")
            .watch("b.txt", "B")
            .build(),
    );

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    h.wait_for_generation(1).await;
    // Watch file + two watch points.
    assert_eq!(h.source.total_active(), 3);

    let source = h.source.clone();
    assert_eq!(h.stop().await?, Outcome::Shutdown);
    assert_eq!(source.total_active(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_entries_are_skipped_not_fatal() -> TestResult {
    init_tracing();

    let ws = TestWorkspace::new();
    ws.touch("a.txt");
    ws.write_watch_file(
        WatchFileBuilder::new()
            .raw("- name: no source")
            .watch("a.txt", "A")
            .raw("- 17")
            .build(),
    );

    let mut h = Harness::start(ws, RecordingInspection::new(), continuous());
    let status = h.wait_for_generation(1).await;
    assert_eq!(status.watch_points.len(), 1);
    assert_eq!(status.watch_points[0].name, "A");

    h.stop().await?;
    Ok(())
}
