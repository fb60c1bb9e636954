//! # Services
//!
//! Storage access and collaborator seams. Everything a lifecycle worker
//! talks to lives behind a trait here, injected through constructors so the
//! workers can be exercised against in-memory fakes.
//!
//! - [`leases`] / [`requests`] / [`clusters`] - store traits with Postgres
//!   implementations
//! - [`placement`] / [`quota`] / [`data_plane`] / [`identity`] / [`network`] -
//!   external collaborator contracts (implementations live outside this core)
//! - [`signalbus`] - in-process wake notifications for the reconciler

pub mod clusters;
pub mod data_plane;
pub mod identity;
pub mod leases;
pub mod network;
pub mod placement;
pub mod quota;
pub mod requests;
pub mod signalbus;

pub use clusters::ClusterStore;
pub use data_plane::{DataPlaneService, InstanceState};
pub use identity::{IdentityService, ServiceAccount};
pub use leases::{LeaseClaim, LeaseStore};
pub use network::NetworkService;
pub use placement::PlacementStrategy;
pub use quota::QuotaService;
pub use requests::RequestStore;
pub use signalbus::SignalBus;
