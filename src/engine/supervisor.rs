// src/engine/supervisor.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{load_watch_points, LoadedEntries};
use crate::engine::barrier::CompletionBarrier;
use crate::engine::dispatch::DispatchTask;
use crate::engine::generation::Generation;
use crate::engine::{GenerationSignal, GenerationStatus, Outcome, SupervisorOptions};
use crate::errors::{PatrolError, Result};
use crate::inspect::Inspection;
use crate::logging::report_failure;
use crate::types::{FileEvent, FileEventKind};
use crate::watch::FileEventSource;

/// Watches the watch file and keeps exactly one generation of watch points
/// alive, rebuilding it on every change.
///
/// All generation state is owned by [`Supervisor::run`]'s loop; nothing
/// else mutates it, so no locking is involved.
pub struct Supervisor<S: FileEventSource> {
    source: S,
    config_path: PathBuf,
    base_dir: PathBuf,
    inspection: Arc<dyn Inspection>,
    options: SupervisorOptions,
    status_tx: watch::Sender<GenerationStatus>,
}

impl<S: FileEventSource> fmt::Debug for Supervisor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("config_path", &self.config_path)
            .field("base_dir", &self.base_dir)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Mutable state of one `run`.
struct LoopState {
    current: Option<Generation>,
    last_id: u64,
    root: CancellationToken,
    signals: mpsc::UnboundedSender<GenerationSignal>,
}

impl<S: FileEventSource> Supervisor<S> {
    /// - `config_path` is the watch file.
    /// - `base_dir` resolves relative watch point sources (normally the
    ///   working directory).
    pub fn new(
        source: S,
        config_path: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        inspection: Arc<dyn Inspection>,
        options: SupervisorOptions,
    ) -> Self {
        let (status_tx, _) = watch::channel(GenerationStatus::default());
        Self {
            source,
            config_path: config_path.into(),
            base_dir: base_dir.into(),
            inspection,
            options,
            status_tx,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Follow the live generation. Updated after every rebuild.
    pub fn status(&self) -> watch::Receiver<GenerationStatus> {
        self.status_tx.subscribe()
    }

    /// Main event loop.
    ///
    /// - Consumes watch file events one at a time, in order.
    /// - Retires the previous generation completely before building the
    ///   next one.
    /// - Returns `Outcome::Completed` once a run-once generation has been
    ///   fully inspected, `Outcome::Shutdown` once `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) -> Result<Outcome> {
        let mut config_events = self.source.subscribe(&self.config_path)?;
        let (signals, mut signal_rx) = mpsc::unbounded_channel();

        let mut state = LoopState {
            current: None,
            last_id: 0,
            root: shutdown.child_token(),
            signals,
        };

        info!(
            config = ?self.config_path,
            run_once = self.options.run_once,
            dry_run = self.options.dry_run,
            "patrol started"
        );

        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("shutdown requested");
                    break Ok(Outcome::Shutdown);
                }
                Some(signal) = signal_rx.recv() => {
                    if let Some(outcome) = self.on_signal(signal, state.current.as_ref()) {
                        break outcome;
                    }
                }
                event = config_events.next() => {
                    let Some(event) = event else {
                        info!("watch file event stream ended");
                        break Ok(Outcome::Shutdown);
                    };
                    if let Err(err) = self.on_config_event(event, &mut state).await {
                        break Err(err);
                    }
                }
            }
        };

        if let Some(generation) = state.current.take() {
            generation.retire().await;
        }
        state.root.cancel();
        config_events.close();
        self.status_tx.send_replace(GenerationStatus::default());

        debug!(?outcome, "supervisor stopped");
        outcome
    }

    async fn on_config_event(&self, event: FileEvent, state: &mut LoopState) -> Result<()> {
        debug!(kind = %event.kind, "watch file event");

        if !event.kind.triggers_rebuild() {
            warn!(
                config = ?self.config_path,
                "watch file deleted; keeping current watch points"
            );
            return Ok(());
        }

        // Pause before parsing: nothing of the current generation runs
        // once the event is accepted. A broken edit resumes it instead of
        // taking it down.
        let gate = state.current.as_ref().map(Generation::gate);
        let paused = match gate {
            Some(gate) => Some(gate.write_owned().await),
            None => None,
        };

        let entries = match self.load().await {
            Ok(entries) => entries,
            Err(err) => match &state.current {
                Some(current) => {
                    report_failure(
                        &format!("keeping generation {}", current.id()),
                        &anyhow::Error::new(err),
                        self.options.debug,
                    );
                    return Ok(());
                }
                None => return Err(err),
            },
        };

        if let Some(previous) = state.current.take() {
            debug!(generation = previous.id(), "retiring generation");
            previous.retire().await;
        }
        drop(paused);

        state.last_id += 1;
        let generation = self.build_generation(state.last_id, entries, event.kind, state);
        self.status_tx.send_replace(generation.status());
        state.current = Some(generation);

        Ok(())
    }

    /// Read and validate the watch file on the blocking pool.
    async fn load(&self) -> Result<LoadedEntries> {
        let config_path = self.config_path.clone();
        let base_dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || load_watch_points(&config_path, &base_dir))
            .await
            .map_err(|e| PatrolError::Other(anyhow::anyhow!("watch file loader failed: {e}")))?
    }

    fn build_generation(
        &self,
        id: u64,
        entries: LoadedEntries,
        kind: FileEventKind,
        state: &LoopState,
    ) -> Generation {
        let mut generation = Generation::new(id, &state.root);
        let barrier = self.options.run_once.then(CompletionBarrier::new);

        for entry in entries {
            let watch_point = match entry {
                Ok(wp) => wp,
                Err(err) => {
                    warn!(generation = id, "skipping watch point: {err}");
                    continue;
                }
            };

            if !watch_point.path().exists() {
                warn!(
                    generation = id,
                    watch_point = %watch_point.name(),
                    "file {} doesn't exist",
                    watch_point.source()
                );
                continue;
            }

            let subscription = match self.source.subscribe(watch_point.path()) {
                Ok(subscription) => subscription,
                Err(err) => {
                    warn!(generation = id, watch_point = %watch_point.name(), "{err}");
                    continue;
                }
            };

            let barrier_entry = barrier.as_ref().map(|b| b.register(&watch_point));

            generation.spawn(DispatchTask {
                generation: id,
                watch_point: Arc::new(watch_point),
                subscription,
                inspection: Arc::clone(&self.inspection),
                cancel: generation.cancel_token(),
                gate: generation.gate(),
                barrier_entry,
                dry_run: self.options.dry_run,
                debug: self.options.debug,
            });
        }

        let file_name = self
            .config_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config_path.display().to_string());
        let verb = if kind == FileEventKind::Initialized {
            "loaded"
        } else {
            "changed"
        };
        info!(generation = id, watch_points = generation.len(), "{file_name} {verb}");

        if let Some(barrier) = barrier {
            debug!(
                generation = id,
                pending = barrier.pending(),
                "awaiting first inspection of every watch point"
            );
            generation.watch_completion(
                barrier,
                self.options.run_once_timeout,
                state.signals.clone(),
            );
        }

        generation
    }

    /// `Some` ends the loop.
    fn on_signal(
        &self,
        signal: GenerationSignal,
        current: Option<&Generation>,
    ) -> Option<Result<Outcome>> {
        if current.map(Generation::id) != Some(signal.generation()) {
            debug!(?signal, "ignoring signal from a retired generation");
            return None;
        }

        match signal {
            GenerationSignal::Completed { generation } => {
                info!(generation, "every watch point inspected");
                Some(Ok(Outcome::Completed))
            }
            GenerationSignal::DeadlineElapsed { generation } => {
                let limit = self.options.run_once_timeout.unwrap_or_default();
                warn!(generation, ?limit, "run-once deadline elapsed");
                Some(Err(PatrolError::RunOnceTimeout(limit)))
            }
        }
    }
}
