// src/engine/generation.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::WatchPoint;
use crate::engine::barrier::CompletionBarrier;
use crate::engine::dispatch::DispatchTask;
use crate::engine::{GenerationSignal, GenerationStatus, WatchPointIdentity};

/// The live watcher set of one configuration generation.
///
/// Owns every dispatch task it spawned (and through them every open
/// subscription). Only the supervisor loop touches it.
pub(crate) struct Generation {
    id: u64,
    cancel: CancellationToken,
    gate: Arc<RwLock<()>>,
    tasks: JoinSet<()>,
    watch_points: Vec<Arc<WatchPoint>>,
}

impl Generation {
    /// `parent` cancels this generation when the supervisor goes down.
    pub(crate) fn new(id: u64, parent: &CancellationToken) -> Self {
        Self {
            id,
            cancel: parent.child_token(),
            gate: Arc::new(RwLock::new(())),
            tasks: JoinSet::new(),
            watch_points: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Read side for dispatch tasks. Holding the write side pauses the
    /// generation: in-flight inspections finish, no new one starts.
    pub(crate) fn gate(&self) -> Arc<RwLock<()>> {
        Arc::clone(&self.gate)
    }

    pub(crate) fn spawn(&mut self, task: DispatchTask) {
        self.watch_points.push(Arc::clone(&task.watch_point));
        self.tasks.spawn(task.run());
    }

    pub(crate) fn len(&self) -> usize {
        self.watch_points.len()
    }

    /// Report back to the supervisor once every watch point of this
    /// generation has been inspected, or once `deadline` elapses.
    pub(crate) fn watch_completion(
        &mut self,
        barrier: CompletionBarrier,
        deadline: Option<Duration>,
        signals: mpsc::UnboundedSender<GenerationSignal>,
    ) {
        let generation = self.id;
        let cancel = self.cancel.clone();
        let all_settled = barrier.wait_all();

        self.tasks.spawn(async move {
            let signal = tokio::select! {
                _ = cancel.cancelled() => return,
                settled = with_deadline(all_settled, deadline) => {
                    if settled {
                        GenerationSignal::Completed { generation }
                    } else {
                        GenerationSignal::DeadlineElapsed { generation }
                    }
                }
            };
            let _ = signals.send(signal);
        });
    }

    pub(crate) fn status(&self) -> GenerationStatus {
        GenerationStatus {
            generation: self.id,
            watch_points: self
                .watch_points
                .iter()
                .map(|wp| WatchPointIdentity {
                    name: wp.name().to_string(),
                    path: wp.path().to_path_buf(),
                })
                .collect(),
        }
    }

    /// Cancel every task of this generation and wait until all of them have
    /// actually finished (and so closed their subscriptions).
    pub(crate) async fn retire(mut self) {
        self.cancel.cancel();

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    error!(generation = self.id, "dispatch task panicked: {err}");
                }
            }
        }

        debug!(generation = self.id, "generation retired");
    }
}

/// `true` if `fut` completed, `false` if the deadline hit first.
async fn with_deadline<F>(fut: F, deadline: Option<Duration>) -> bool
where
    F: std::future::Future<Output = ()>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.is_ok(),
        None => {
            fut.await;
            true
        }
    }
}
