//! # Reconciler
//!
//! The generic execution engine behind every worker: run the worker's
//! reconciliation pass immediately on start, then on a fixed tick and on
//! explicit wake signals, until stopped.
//!
//! Each started worker gets exactly one background task, which makes the
//! non-overlap guarantee structural: passes for the same worker are executed
//! sequentially by that task, never concurrently. `stop` is the completion
//! barrier: it signals the task and awaits its `JoinHandle`, so no
//! reconciliation for that worker is running after `stop` returns.
//!
//! Most lifecycle transitions are driven by slow external systems and are
//! adequately served by polling; the signal-bus wake path exists for the
//! minority of transitions (right after a client-facing mutation) that
//! benefit from sub-tick latency.

use crate::config::ReconcilerConfig;
use crate::constants::reconcile_topic;
use crate::services::signalbus::SignalBus;
use crate::workers::Worker;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct LoopHandle {
    stop_tx: watch::Sender<bool>,
    passes: watch::Receiver<u64>,
    join: JoinHandle<()>,
}

/// Generic scheduling loop shared by all workers.
pub struct Reconciler {
    config: ReconcilerConfig,
    signal_bus: Arc<SignalBus>,
    loops: Mutex<HashMap<String, LoopHandle>>,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, signal_bus: Arc<SignalBus>) -> Self {
        Self {
            config,
            signal_bus,
            loops: Mutex::new(HashMap::new()),
        }
    }

    /// Start reconciling the worker. Idempotent per worker instance.
    ///
    /// One pass is performed before this returns, so callers can rely on at
    /// least one pass having started; subsequent passes run in the
    /// background on every tick and wake until [`stop`](Self::stop).
    pub async fn start(&self, worker: Arc<dyn Worker>) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (pass_tx, pass_rx) = watch::channel(0u64);
        let signal = self
            .signal_bus
            .subscribe(&reconcile_topic(worker.worker_type()));
        let interval = self.config.interval();
        let task_worker = worker.clone();

        // Check and insert under a single lock acquisition; a racing start
        // for the same worker must not run a second first pass.
        {
            let mut loops = self.loops.lock();
            if loops.contains_key(worker.id()) {
                return;
            }
            worker.set_running(true);
            let join = tokio::spawn(async move {
                Self::run_pass(task_worker.as_ref()).await;
                let mut completed = 1u64;
                let _ = pass_tx.send(completed);

                let start = tokio::time::Instant::now() + interval;
                let mut ticker = tokio::time::interval_at(start, interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = stop_rx.changed() => break,
                        _ = ticker.tick() => {}
                        _ = signal.wait() => {}
                    }
                    Self::run_pass(task_worker.as_ref()).await;
                    completed += 1;
                    let _ = pass_tx.send(completed);
                }
                task_worker.set_running(false);
            });
            loops.insert(
                worker.id().to_string(),
                LoopHandle {
                    stop_tx,
                    passes: pass_rx.clone(),
                    join,
                },
            );
        }

        // block until the first pass has completed (or the loop was stopped
        // out from under us, which closes the channel)
        let mut passes = pass_rx;
        while *passes.borrow_and_update() == 0 {
            if passes.changed().await.is_err() {
                break;
            }
        }
    }

    /// Stop reconciling the worker and wait for the in-flight pass (if any)
    /// to complete. No pass for this worker runs after this returns.
    pub async fn stop(&self, worker: &dyn Worker) {
        let handle = self.loops.lock().remove(worker.id());
        if let Some(handle) = handle {
            let _ = handle.stop_tx.send(true);
            if let Err(err) = handle.join.await {
                warn!(
                    worker_id = worker.id(),
                    worker_type = worker.worker_type(),
                    error = %err,
                    "reconcile loop did not shut down cleanly"
                );
            }
        }
        worker.set_running(false);
    }

    /// Request an out-of-cycle pass for the worker.
    ///
    /// When `immediate`, blocks until a pass triggered at or after this call
    /// has completed; otherwise the wake is best-effort and merges with any
    /// already-pending wake.
    pub async fn wakeup(&self, worker: &dyn Worker, immediate: bool) {
        let passes = self
            .loops
            .lock()
            .get(worker.id())
            .map(|handle| handle.passes.clone());

        self.signal_bus
            .notify(&reconcile_topic(worker.worker_type()));

        if immediate {
            if let Some(mut passes) = passes {
                let seen = *passes.borrow();
                while *passes.borrow_and_update() <= seen {
                    if passes.changed().await.is_err() {
                        // loop exited; nothing more will run
                        break;
                    }
                }
            }
        }
    }

    async fn run_pass(worker: &dyn Worker) {
        debug!(
            worker_id = worker.id(),
            worker_type = worker.worker_type(),
            "reconciling"
        );
        for err in worker.reconcile().await {
            warn!(
                worker_id = worker.id(),
                worker_type = worker.worker_type(),
                error = %err,
                "reconcile error"
            );
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("interval", &self.config.interval())
            .field("active_loops", &self.loops.lock().len())
            .finish()
    }
}
