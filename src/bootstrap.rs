//! # Bootstrap
//!
//! Process wiring: assemble the reconciliation core from configuration and
//! injected collaborators. Every worker and manager receives its
//! dependencies through constructors; there is no package-level state.

use crate::config::FleetConfig;
use crate::database::DatabaseConnection;
use crate::services::clusters::{ClusterStore, PostgresClusterStore};
use crate::services::data_plane::DataPlaneService;
use crate::services::identity::IdentityService;
use crate::services::leases::{LeaseStore, PostgresLeaseStore};
use crate::services::network::NetworkService;
use crate::services::placement::PlacementStrategy;
use crate::services::quota::QuotaService;
use crate::services::requests::{PostgresRequestStore, RequestStore};
use crate::services::signalbus::SignalBus;
use crate::workers::request_mgrs::{
    AcceptedRequestManager, CertificateRequestManager, DeletingRequestManager,
    FailedRequestManager, PreparingRequestManager, ProvisioningRequestManager,
    ReadyRequestManager, RoutesRequestManager, StreamRequestManager,
};
use crate::workers::{LeaderElectionManager, Reconciler, Worker};
use std::sync::Arc;

/// External collaborators consumed by the lifecycle workers.
///
/// Implementations of the placement, quota, data-plane, identity and network
/// seams live outside this crate and are supplied by the embedding process.
pub struct Collaborators {
    pub placement: Arc<dyn PlacementStrategy>,
    pub quota: Arc<dyn QuotaService>,
    pub data_plane: Arc<dyn DataPlaneService>,
    pub identity: Arc<dyn IdentityService>,
    pub network: Arc<dyn NetworkService>,
}

/// Every service the reconciliation core depends on.
pub struct CoreServices {
    pub leases: Arc<dyn LeaseStore>,
    pub requests: Arc<dyn RequestStore>,
    pub clusters: Arc<dyn ClusterStore>,
    pub placement: Arc<dyn PlacementStrategy>,
    pub quota: Arc<dyn QuotaService>,
    pub data_plane: Arc<dyn DataPlaneService>,
    pub identity: Arc<dyn IdentityService>,
    pub network: Arc<dyn NetworkService>,
}

impl CoreServices {
    /// Postgres-backed stores over the given connection, combined with the
    /// externally supplied collaborators.
    pub fn new(db: &DatabaseConnection, collaborators: Collaborators) -> Self {
        Self {
            leases: Arc::new(PostgresLeaseStore::new(db.pool().clone())),
            requests: Arc::new(PostgresRequestStore::new(db.pool().clone())),
            clusters: Arc::new(PostgresClusterStore::new(db.pool().clone())),
            placement: collaborators.placement,
            quota: collaborators.quota,
            data_plane: collaborators.data_plane,
            identity: collaborators.identity,
            network: collaborators.network,
        }
    }
}

/// The assembled reconciliation core, ready to start.
pub struct FleetCore {
    pub signal_bus: Arc<SignalBus>,
    pub reconciler: Arc<Reconciler>,
    pub manager: Arc<LeaderElectionManager>,
}

/// Every lifecycle worker this control plane registers, in state-machine
/// order. Each worker type must have a seeded leader lease row.
pub fn build_workers(services: &CoreServices, config: &FleetConfig) -> Vec<Arc<dyn Worker>> {
    let requests = &config.requests;
    vec![
        Arc::new(AcceptedRequestManager::new(
            services.requests.clone(),
            services.placement.clone(),
            services.quota.clone(),
            requests.clone(),
        )),
        Arc::new(PreparingRequestManager::new(
            services.requests.clone(),
            services.data_plane.clone(),
            requests.clone(),
        )),
        Arc::new(ProvisioningRequestManager::new(
            services.requests.clone(),
            services.clusters.clone(),
            services.placement.clone(),
            services.data_plane.clone(),
            requests.clone(),
        )),
        Arc::new(ReadyRequestManager::new(
            services.requests.clone(),
            services.identity.clone(),
        )),
        Arc::new(FailedRequestManager::new(
            services.requests.clone(),
            services.identity.clone(),
        )),
        Arc::new(DeletingRequestManager::new(
            services.requests.clone(),
            services.quota.clone(),
            requests.clone(),
        )),
        Arc::new(RoutesRequestManager::new(
            services.requests.clone(),
            services.network.clone(),
        )),
        Arc::new(CertificateRequestManager::new(
            services.requests.clone(),
            services.network.clone(),
        )),
        Arc::new(StreamRequestManager::new(
            services.requests.clone(),
            requests.clone(),
        )),
    ]
}

/// Assemble the signal bus, reconciler and leader election manager around
/// the full worker set.
pub fn build_core(config: &FleetConfig, services: &CoreServices) -> FleetCore {
    let signal_bus = Arc::new(SignalBus::new());
    let reconciler = Arc::new(Reconciler::new(
        config.reconciler.clone(),
        signal_bus.clone(),
    ));
    let workers = build_workers(services, config);
    let manager = Arc::new(LeaderElectionManager::new(
        workers,
        reconciler.clone(),
        services.leases.clone(),
        config.leader_election.clone(),
    ));
    FleetCore {
        signal_bus,
        reconciler,
        manager,
    }
}
