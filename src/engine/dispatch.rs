// src/engine/dispatch.rs

//! Per-watch-point dispatch task.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::WatchPoint;
use crate::engine::barrier::BarrierEntry;
use crate::inspect::Inspection;
use crate::logging::report_failure;
use crate::types::FileEvent;
use crate::watch::Subscription;

/// Consumes one watch point's events and runs the inspection for each
/// significant one.
///
/// - Owns the watch point's [`Subscription`]; it is closed when the task
///   ends, whatever the reason.
/// - Never starts an inspection once `cancel` has fired. An inspection that
///   is already running is waited for, so retiring a generation also waits
///   for its in-flight inspections.
/// - Every inspection holds a read permit of `gate`. While the supervisor
///   holds the write side no inspection starts.
/// - With a barrier entry (run-once), stops after the first inspection.
pub(crate) struct DispatchTask {
    pub(crate) generation: u64,
    pub(crate) watch_point: Arc<WatchPoint>,
    pub(crate) subscription: Subscription,
    pub(crate) inspection: Arc<dyn Inspection>,
    pub(crate) cancel: CancellationToken,
    pub(crate) gate: Arc<RwLock<()>>,
    pub(crate) barrier_entry: Option<BarrierEntry>,
    pub(crate) dry_run: bool,
    pub(crate) debug: bool,
}

impl DispatchTask {
    pub(crate) async fn run(mut self) {
        let name = self.watch_point.name().to_string();
        debug!(generation = self.generation, watch_point = %name, "dispatch task started");

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(generation = self.generation, watch_point = %name, "dispatch task cancelled");
                    break;
                }
                event = self.subscription.next() => match event {
                    Some(event) => event,
                    None => {
                        debug!(generation = self.generation, watch_point = %name, "event stream ended");
                        break;
                    }
                },
            };

            if !event.is_significant() {
                trace!(watch_point = %name, path = ?event.path, "skipping directory modification");
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&self.gate).read_owned() => permit,
            };
            if self.cancel.is_cancelled() {
                break;
            }

            inspect(
                Arc::clone(&self.watch_point),
                Arc::clone(&self.inspection),
                &event,
                self.dry_run,
                self.debug,
            )
            .await;
            drop(permit);

            if let Some(entry) = self.barrier_entry.take() {
                entry.settle();
                debug!(watch_point = %name, "run-once obligation met; closing watcher");
                break;
            }
        }

        self.subscription.close();
    }
}

/// Run one inspection on the blocking pool and log how it went.
///
/// Takes owned handles so the dispatch task itself is never borrowed
/// across the blocking call.
async fn inspect(
    watch_point: Arc<WatchPoint>,
    inspection: Arc<dyn Inspection>,
    event: &FileEvent,
    dry_run: bool,
    debug: bool,
) {
    let name = watch_point.name().to_string();
    info!(watch_point = %name, kind = %event.kind, "{}", event.path.display());

    let outcome =
        tokio::task::spawn_blocking(move || inspection.inspect(&watch_point, dry_run)).await;

    match outcome {
        Ok(Ok(())) => debug!(watch_point = %name, "inspection finished"),
        Ok(Err(err)) => report_failure(&format!("inspection of '{name}' failed"), &err, debug),
        Err(join_err) if join_err.is_panic() => {
            error!(watch_point = %name, "inspection panicked")
        }
        Err(join_err) => {
            error!(watch_point = %name, "inspection did not complete: {join_err}")
        }
    }
}
