// src/engine/barrier.rs

//! Completion barrier for `--run-once`.
//!
//! One [`BarrierEntry`] is registered per watch point of a generation and
//! settled after that watch point's first inspection. [`CompletionBarrier::wait_all`]
//! resolves once nothing is pending.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::config::WatchPoint;

#[derive(Debug, Clone)]
pub struct CompletionBarrier {
    pending: Arc<watch::Sender<usize>>,
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionBarrier {
    pub fn new() -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            pending: Arc::new(pending),
        }
    }

    /// Add a pending entry for `watch_point`.
    pub fn register(&self, watch_point: &WatchPoint) -> BarrierEntry {
        self.pending.send_modify(|n| *n += 1);
        BarrierEntry {
            pending: Arc::clone(&self.pending),
            name: watch_point.name().to_string(),
            settled: AtomicBool::new(false),
        }
    }

    /// Entries registered and not yet settled.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Resolves when every registered entry is settled (immediately if none
    /// were registered).
    pub fn wait_all(&self) -> impl Future<Output = ()> + Send + 'static {
        let pending = Arc::clone(&self.pending);
        async move {
            let mut rx = pending.subscribe();
            // `pending` keeps the sender alive, so this only returns once
            // the count reaches zero.
            let _ = rx.wait_for(|n| *n == 0).await;
        }
    }
}

/// One watch point's obligation in a [`CompletionBarrier`].
#[derive(Debug)]
pub struct BarrierEntry {
    pending: Arc<watch::Sender<usize>>,
    name: String,
    settled: AtomicBool,
}

impl BarrierEntry {
    /// Mark this entry done. Settling twice is a no-op.
    pub fn settle(&self) {
        if self.settled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
        debug!(watch_point = %self.name, remaining = *self.pending.borrow(), "barrier entry settled");
    }

    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
