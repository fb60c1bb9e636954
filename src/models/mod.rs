//! # Persisted Entities
//!
//! Data layer for the reconciliation core:
//!
//! - [`leader_lease`] - the per-worker-type exclusive execution claim
//! - [`request`] - stream requests and their lifecycle status state machine
//! - [`cluster`] - backing data-plane clusters referenced by placement

pub mod cluster;
pub mod leader_lease;
pub mod request;

pub use cluster::{Cluster, ClusterStatus, StreamVersion};
pub use leader_lease::LeaderLease;
pub use request::{RequestStatus, StreamRequest};
