//! # Workers
//!
//! The reconciliation machinery: the uniform [`Worker`] contract, the
//! generic [`reconciler`] scheduling loop, the database-backed
//! [`leader_election`] arbitrating which process runs each worker type, the
//! [`retry`] policy, and the per-status lifecycle managers in
//! [`request_mgrs`].

pub mod leader_election;
pub mod reconciler;
pub mod request_mgrs;
pub mod retry;

pub use leader_election::{LeaderElectionManager, LeaseAcquisition};
pub use reconciler::Reconciler;

use crate::error::ServiceError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Identity and running state shared by every worker implementation.
#[derive(Debug)]
pub struct BaseWorker {
    id: String,
    worker_type: String,
    running: AtomicBool,
}

impl BaseWorker {
    /// A new worker instance with a random id. Many instances (one per
    /// process per type) compete for the single leader lease of their type.
    pub fn new(worker_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            worker_type: worker_type.into(),
            running: AtomicBool::new(false),
        }
    }
}

/// The uniform contract every lifecycle-stage handler implements.
///
/// A worker performs one reconciliation pass at a time: list the entities it
/// owns, act on each independently, and return the accumulated per-entity
/// errors without aborting the batch on the first failure. Scheduling,
/// non-overlap and shutdown are owned by the [`Reconciler`] the worker is
/// bound to.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    fn base(&self) -> &BaseWorker;

    /// Stable instance id, assigned at construction.
    fn id(&self) -> &str {
        &self.base().id
    }

    /// Worker-type string, matching a seeded leader lease row.
    fn worker_type(&self) -> &str {
        &self.base().worker_type
    }

    fn is_running(&self) -> bool {
        self.base().running.load(Ordering::SeqCst)
    }

    fn set_running(&self, val: bool) {
        self.base().running.store(val, Ordering::SeqCst);
    }

    /// One reconciliation pass over every currently eligible entity.
    async fn reconcile(&self) -> Vec<ServiceError>;
}
