#![allow(dead_code)]

pub use patrol_test_utils::builders::{TestWorkspace, WatchFileBuilder};
pub use patrol_test_utils::recording_inspection::{InspectionCall, RecordingInspection};
pub use patrol_test_utils::{init_tracing, settle, wait_until, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use patrol::engine::{GenerationStatus, Outcome, Supervisor, SupervisorOptions};
use patrol::watch::ManualEventSource;

/// A supervisor running in the background against a `ManualEventSource`.
pub struct Harness {
    pub ws: TestWorkspace,
    pub source: ManualEventSource,
    pub inspection: RecordingInspection,
    pub shutdown: CancellationToken,
    pub status: watch::Receiver<GenerationStatus>,
    pub handle: JoinHandle<patrol::Result<Outcome>>,
}

impl Harness {
    /// The watch file must already exist in `ws`.
    pub fn start(
        ws: TestWorkspace,
        inspection: RecordingInspection,
        options: SupervisorOptions,
    ) -> Self {
        let source = ManualEventSource::new();
        let supervisor = Supervisor::new(
            source.clone(),
            ws.watch_file(),
            ws.root(),
            Arc::new(inspection.clone()),
            options,
        );
        let status = supervisor.status();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(supervisor.run(shutdown.clone()));

        Self {
            ws,
            source,
            inspection,
            shutdown,
            status,
            handle,
        }
    }

    /// Wait until generation `n` (or a later one) is live.
    pub async fn wait_for_generation(&mut self, n: u64) -> GenerationStatus {
        let status = tokio::time::timeout(
            Duration::from_secs(2),
            self.status.wait_for(|s| s.generation >= n),
        )
        .await
        .expect("generation never appeared")
        .expect("supervisor dropped its status channel");
        status.clone()
    }

    pub fn current(&self) -> GenerationStatus {
        self.status.borrow().clone()
    }

    /// Rewrite the watch file and report the change.
    pub fn change_watch_file(&self, contents: impl AsRef<str>) {
        let path = self.ws.write_watch_file(contents);
        self.source.emit(path, patrol::FileEventKind::Modified);
    }

    pub async fn wait_for_calls(&self, name: &str, n: usize) {
        let inspection = self.inspection.clone();
        let what = format!("{n} inspection(s) of {name}");
        wait_until(&what, || inspection.count(name) >= n).await;
    }

    /// Cancel and wait for the supervisor to return.
    pub async fn stop(self) -> patrol::Result<Outcome> {
        self.shutdown.cancel();
        with_timeout(self.handle)
            .await
            .expect("supervisor task panicked")
    }
}
