//! In-memory test doubles for the storage and collaborator seams.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleet_core::error::{Result, ServiceError};
use fleet_core::models::{
    Cluster, ClusterStatus, LeaderLease, RequestStatus, StreamRequest, StreamVersion,
};
use fleet_core::services::clusters::ClusterStore;
use fleet_core::services::data_plane::{DataPlaneService, InstanceState};
use fleet_core::services::identity::{IdentityService, ServiceAccount};
use fleet_core::services::leases::{LeaseClaim, LeaseStore};
use fleet_core::services::network::NetworkService;
use fleet_core::services::placement::PlacementStrategy;
use fleet_core::services::quota::QuotaService;
use fleet_core::services::requests::RequestStore;
use fleet_core::workers::{BaseWorker, Worker};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lease store backed by a map, with a non-blocking per-row try-lock
/// standing in for `FOR UPDATE SKIP LOCKED`.
#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: Mutex<HashMap<String, LeaderLease>>,
    row_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an unclaimed (and therefore expired) lease row.
    pub fn seed(&self, lease_type: &str) {
        self.seed_with(lease_type, "", Utc::now());
    }

    pub fn seed_with(&self, lease_type: &str, leader: &str, expires: DateTime<Utc>) {
        let now = Utc::now();
        self.leases.lock().insert(
            lease_type.to_string(),
            LeaderLease {
                id: Uuid::new_v4(),
                lease_type: lease_type.to_string(),
                leader: leader.to_string(),
                expires,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
        );
    }

    pub fn get(&self, lease_type: &str) -> Option<LeaderLease> {
        self.leases.lock().get(lease_type).cloned()
    }

    fn row_lock(&self, lease_type: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.row_locks
            .lock()
            .entry(lease_type.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn find_by_lease_type(&self, lease_type: &str) -> Result<Option<LeaderLease>> {
        Ok(self.leases.lock().get(lease_type).cloned())
    }

    async fn try_claim(
        &self,
        lease_type: &str,
        leader: &str,
        expires: DateTime<Utc>,
    ) -> Result<LeaseClaim> {
        let row_lock = self.row_lock(lease_type);
        let Ok(_guard) = row_lock.try_lock() else {
            return Ok(LeaseClaim::Contended);
        };

        let mut leases = self.leases.lock();
        let Some(lease) = leases.get_mut(lease_type) else {
            return Ok(LeaseClaim::Contended);
        };

        let now = Utc::now();
        if !lease.is_expired(now) && lease.leader != leader {
            return Ok(LeaseClaim::Lost(lease.clone()));
        }

        lease.leader = leader.to_string();
        lease.expires = expires;
        lease.updated_at = now;
        Ok(LeaseClaim::Claimed(lease.clone()))
    }
}

/// Lease store whose every operation fails, for fail-safe behavior tests.
pub struct FailingLeaseStore;

#[async_trait]
impl LeaseStore for FailingLeaseStore {
    async fn find_by_lease_type(&self, _lease_type: &str) -> Result<Option<LeaderLease>> {
        Err(ServiceError::Database("lease table unavailable".into()))
    }

    async fn try_claim(
        &self,
        _lease_type: &str,
        _leader: &str,
        _expires: DateTime<Utc>,
    ) -> Result<LeaseClaim> {
        Err(ServiceError::Database("lease table unavailable".into()))
    }
}

/// Request store backed by a map, preserving soft-delete semantics.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: Mutex<HashMap<String, StreamRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request: StreamRequest) {
        self.requests.lock().insert(request.id.clone(), request);
    }

    /// Raw row access, including soft-deleted requests.
    pub fn get(&self, id: &str) -> Option<StreamRequest> {
        self.requests.lock().get(id).cloned()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn list_by_statuses(&self, statuses: &[RequestStatus]) -> Result<Vec<StreamRequest>> {
        let mut requests: Vec<StreamRequest> = self
            .requests
            .lock()
            .values()
            .filter(|r| r.deleted_at.is_none() && statuses.contains(&r.status))
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn list_all(&self) -> Result<Vec<StreamRequest>> {
        let mut requests: Vec<StreamRequest> = self
            .requests
            .lock()
            .values()
            .filter(|r| r.deleted_at.is_none())
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StreamRequest>> {
        Ok(self
            .requests
            .lock()
            .get(id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn update(&self, request: &StreamRequest) -> Result<()> {
        let mut requests = self.requests.lock();
        if let Some(stored) = requests.get_mut(&request.id) {
            if stored.deleted_at.is_none() {
                let mut updated = request.clone();
                updated.updated_at = Utc::now();
                *stored = updated;
            }
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: RequestStatus) -> Result<bool> {
        let mut requests = self.requests.lock();
        match requests.get_mut(id) {
            Some(stored) if stored.deleted_at.is_none() && stored.status != status => {
                stored.status = status;
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut requests = self.requests.lock();
        if let Some(stored) = requests.get_mut(id) {
            if stored.deleted_at.is_none() {
                stored.deleted_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

/// A ready cluster with one ready platform version.
pub fn ready_cluster(cluster_id: &str) -> Cluster {
    let now = Utc::now();
    Cluster {
        id: Uuid::new_v4().to_string(),
        cluster_id: cluster_id.to_string(),
        cloud_provider: "aws".to_string(),
        region: "us-east-1".to_string(),
        multi_az: true,
        status: ClusterStatus::Ready,
        available_stream_versions: vec![
            StreamVersion {
                version: "3.6.0".to_string(),
                ready: true,
                operator_version: Some("1.1.0".to_string()),
            },
            StreamVersion {
                version: "3.7.0".to_string(),
                ready: true,
                operator_version: Some("1.2.0".to_string()),
            },
        ],
        created_at: now,
        updated_at: now,
    }
}

/// Placement strategy returning a fixed cluster (or none).
#[derive(Default)]
pub struct StaticPlacement {
    cluster: Mutex<Option<Cluster>>,
}

impl StaticPlacement {
    pub fn with_cluster(cluster: Cluster) -> Self {
        Self {
            cluster: Mutex::new(Some(cluster)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlacementStrategy for StaticPlacement {
    async fn find_cluster(&self, _request: &StreamRequest) -> Result<Option<Cluster>> {
        Ok(self.cluster.lock().clone())
    }
}

/// Cluster store over a fixed set of clusters.
#[derive(Default)]
pub struct InMemoryClusterStore {
    clusters: Mutex<HashMap<String, Cluster>>,
}

impl InMemoryClusterStore {
    pub fn insert(&self, cluster: Cluster) {
        self.clusters
            .lock()
            .insert(cluster.cluster_id.clone(), cluster);
    }
}

#[async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn find_cluster_by_id(&self, cluster_id: &str) -> Result<Option<Cluster>> {
        Ok(self.clusters.lock().get(cluster_id).cloned())
    }
}

/// Quota service that counts reservations and can be exhausted.
#[derive(Default)]
pub struct CountingQuota {
    reservations: Mutex<HashMap<String, String>>,
    pub reserve_calls: AtomicUsize,
    pub released: Mutex<Vec<String>>,
    pub exhausted: AtomicBool,
}

impl CountingQuota {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exhaust(&self) {
        self.exhausted.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuotaService for CountingQuota {
    async fn reserve(&self, request: &StreamRequest) -> Result<String> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(ServiceError::InsufficientQuota(
                "quota exhausted for owner".into(),
            ));
        }
        self.reserve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .reservations
            .lock()
            .entry(request.id.clone())
            .or_insert_with(|| format!("sub-{}", request.id))
            .clone())
    }

    async fn release(&self, subscription_id: &str) -> Result<()> {
        self.released.lock().push(subscription_id.to_string());
        Ok(())
    }
}

/// Data-plane double with a scriptable preparation error and instance state.
pub struct ScriptedDataPlane {
    pub prepare_error: Mutex<Option<ServiceError>>,
    pub state: Mutex<InstanceState>,
}

impl Default for ScriptedDataPlane {
    fn default() -> Self {
        Self {
            prepare_error: Mutex::new(None),
            state: Mutex::new(InstanceState::Installing),
        }
    }
}

impl ScriptedDataPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_prepare_with(&self, err: ServiceError) {
        *self.prepare_error.lock() = Some(err);
    }

    pub fn set_state(&self, state: InstanceState) {
        *self.state.lock() = state;
    }
}

#[async_trait]
impl DataPlaneService for ScriptedDataPlane {
    async fn prepare_request(&self, _request: &StreamRequest) -> Result<()> {
        match self.prepare_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn instance_state(&self, _request: &StreamRequest) -> Result<InstanceState> {
        Ok(*self.state.lock())
    }
}

/// Identity provider issuing deterministic per-request accounts.
#[derive(Default)]
pub struct StaticIdentity {
    pub issued: AtomicUsize,
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn ensure_service_account(
        &self,
        prefix: &str,
        request_id: &str,
    ) -> Result<ServiceAccount> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(ServiceAccount {
            client_id: format!("{prefix}-{request_id}"),
            secret: format!("secret-{request_id}"),
        })
    }
}

/// Network service returning deterministic hosts and certificate refs.
#[derive(Default)]
pub struct StaticNetwork;

#[async_trait]
impl NetworkService for StaticNetwork {
    async fn ensure_bootstrap_record(&self, request: &StreamRequest) -> Result<String> {
        Ok(format!("{}.bootstrap.example.com", request.id))
    }

    async fn ensure_certificate(&self, request: &StreamRequest) -> Result<String> {
        Ok(format!("cert-{}", request.id))
    }
}

/// Worker double counting passes, with an optional per-pass delay and an
/// overlap detector.
pub struct CountingWorker {
    base: BaseWorker,
    pub passes: AtomicUsize,
    pub overlaps: AtomicUsize,
    busy: AtomicBool,
    delay: Duration,
}

impl CountingWorker {
    pub fn new(worker_type: &str) -> Self {
        Self::with_delay(worker_type, Duration::ZERO)
    }

    pub fn with_delay(worker_type: &str, delay: Duration) -> Self {
        Self {
            base: BaseWorker::new(worker_type),
            passes: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
            busy: AtomicBool::new(false),
            delay,
        }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for CountingWorker {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.passes.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        Vec::new()
    }
}
