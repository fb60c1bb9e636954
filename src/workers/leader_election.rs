//! # Leader Election
//!
//! Database-backed leader election giving each worker type an independent,
//! crash-tolerant exclusive owner without a separate coordination service.
//!
//! The manager polls every registered worker on a fixed interval, acquires
//! (or fails to acquire) the worker type's leader lease, and starts or stops
//! the worker accordingly. Liveness recovers automatically once a lease
//! expires, and contention is non-blocking: failing to acquire is a normal,
//! cheap outcome retried on the next poll.

use crate::config::LeaderElectionConfig;
use crate::error::Result;
use crate::models::LeaderLease;
use crate::services::leases::{missing_lease_error, LeaseClaim, LeaseStore};
use crate::workers::{Reconciler, Worker};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Whether a worker successfully acquired or retained the leader lease, and
/// the lease as currently known. The lease may not belong to the worker; see
/// `acquired`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseAcquisition {
    pub acquired: bool,
    pub current_lease: LeaderLease,
}

/// Starts and stops registered workers based on per-worker-type leader
/// leases.
pub struct LeaderElectionManager {
    workers: Vec<Arc<dyn Worker>>,
    reconciler: Arc<Reconciler>,
    lease_store: Arc<dyn LeaseStore>,
    config: LeaderElectionConfig,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    join: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LeaderElectionManager {
    pub fn new(
        workers: Vec<Arc<dyn Worker>>,
        reconciler: Arc<Reconciler>,
        lease_store: Arc<dyn LeaseStore>,
        config: LeaderElectionConfig,
    ) -> Self {
        Self {
            workers,
            reconciler,
            lease_store,
            config,
            stop_tx: Mutex::new(None),
            join: tokio::sync::Mutex::new(None),
        }
    }

    /// Start the polling loop. Leadership is evaluated once immediately and
    /// then every polling interval.
    pub async fn start(self: &Arc<Self>) {
        {
            let mut stop_guard = self.stop_tx.lock();
            if stop_guard.is_some() {
                return;
            }
            let (tx, _) = watch::channel(false);
            *stop_guard = Some(tx);
        }
        let mut stop_rx = {
            let guard = self.stop_tx.lock();
            match guard.as_ref() {
                Some(tx) => tx.subscribe(),
                None => return,
            }
        };

        info!("starting leader election manager");
        let manager = Arc::clone(self);
        let join = tokio::spawn(async move {
            manager.reconcile_leadership().await;
            let interval = manager.config.polling_interval();
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => manager.reconcile_leadership().await,
                }
            }

            // No orphaned reconciliation work survives shutdown: stop every
            // running worker and await each in-flight pass.
            for worker in &manager.workers {
                if worker.is_running() {
                    info!(
                        worker_id = worker.id(),
                        worker_type = worker.worker_type(),
                        "stopping worker on manager shutdown"
                    );
                    manager.reconciler.stop(worker.as_ref()).await;
                }
            }
        });
        *self.join.lock().await = Some(join);
    }

    /// Stop the polling loop, stop all running workers and wait for their
    /// completion before returning.
    pub async fn stop(&self) {
        let stop_tx = self.stop_tx.lock().take();
        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.send(true);
        }
        if let Some(join) = self.join.lock().await.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "leader election manager did not shut down cleanly");
            }
        }
    }

    async fn reconcile_leadership(&self) {
        for worker in &self.workers {
            let is_leader = self.is_worker_leader(worker.as_ref()).await;
            if is_leader && !worker.is_running() {
                info!(
                    worker_id = worker.id(),
                    worker_type = worker.worker_type(),
                    "running as the leader, starting worker"
                );
                self.reconciler.start(worker.clone()).await;
            } else if !is_leader && worker.is_running() {
                info!(
                    worker_id = worker.id(),
                    worker_type = worker.worker_type(),
                    "no longer the leader, stopping worker"
                );
                self.reconciler.stop(worker.as_ref()).await;
            }
        }
    }

    async fn is_worker_leader(&self, worker: &dyn Worker) -> bool {
        match self
            .acquire_leader_lease(worker.id(), worker.worker_type())
            .await
        {
            Ok(acquisition) => {
                if !acquisition.acquired {
                    debug!(
                        worker_id = worker.id(),
                        worker_type = worker.worker_type(),
                        "not currently leader, skipping reconcile"
                    );
                }
                acquisition.acquired
            }
            Err(err) => {
                // We don't know whether we're the leader; never assume
                // leadership on uncertainty.
                warn!(
                    worker_type = worker.worker_type(),
                    error = %err,
                    "failed to acquire leader lease"
                );
                false
            }
        }
    }

    /// Attempt to claim the leader role for a worker type.
    ///
    /// The lease is read unlocked first to see whether the worker has an
    /// opportunity to acquire it (expired), extend it (own lease nearing
    /// expiry) or continue on it (own lease with a safely-future expiry,
    /// the cheap steady-state path with no storage write).
    pub async fn acquire_leader_lease(
        &self,
        worker_id: &str,
        worker_type: &str,
    ) -> Result<LeaseAcquisition> {
        let lease = self
            .lease_store
            .find_by_lease_type(worker_type)
            .await?
            .ok_or_else(|| missing_lease_error(worker_type))?;

        let now = Utc::now();
        let new_expires = now
            + chrono::Duration::seconds(self.config.lease_duration().as_secs() as i64);
        let renew_ahead =
            chrono::Duration::seconds(self.config.renew_ahead().as_secs() as i64);

        let expired = lease.is_expired(now);
        let renewable = lease.leader == worker_id && lease.expires - renew_ahead <= now;

        if expired || renewable {
            return match self
                .lease_store
                .try_claim(worker_type, worker_id, new_expires)
                .await?
            {
                LeaseClaim::Claimed(updated) => Ok(LeaseAcquisition {
                    acquired: true,
                    current_lease: updated,
                }),
                LeaseClaim::Contended if expired => {
                    debug!(
                        worker_type,
                        "failed to lock leader lease for update, skipping"
                    );
                    Ok(LeaseAcquisition {
                        acquired: false,
                        current_lease: lease,
                    })
                }
                // The row lock is held but our unexpired lease names us
                // leader: a sibling worker in this process is extending it.
                LeaseClaim::Contended => Ok(LeaseAcquisition {
                    acquired: true,
                    current_lease: lease,
                }),
                LeaseClaim::Lost(current) => Ok(LeaseAcquisition {
                    acquired: false,
                    current_lease: current,
                }),
            };
        }

        if lease.leader == worker_id {
            // Unexpired lease, no renewal due: leader without touching
            // storage.
            return Ok(LeaseAcquisition {
                acquired: true,
                current_lease: lease,
            });
        }

        Ok(LeaseAcquisition {
            acquired: false,
            current_lease: lease,
        })
    }
}

impl std::fmt::Debug for LeaderElectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderElectionManager")
            .field("workers", &self.workers.len())
            .field("polling_interval", &self.config.polling_interval())
            .finish()
    }
}
