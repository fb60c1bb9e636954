//! Worker for `provisioning` requests: re-placement of requests that lost
//! their cluster assignment, and instance-state polling when the data plane
//! does not report status back.

use crate::config::RequestConfig;
use crate::constants::WORKER_TYPE_PROVISIONING;
use crate::error::ServiceError;
use crate::models::{RequestStatus, StreamRequest};
use crate::services::clusters::ClusterStore;
use crate::services::data_plane::{DataPlaneService, InstanceState};
use crate::services::placement::PlacementStrategy;
use crate::services::requests::RequestStore;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Drives `provisioning` requests to `ready`.
///
/// A request that lost its cluster assignment is re-placed and its desired
/// versions re-derived from the newly assigned cluster. Failing to find a
/// viable cluster is reported and retried on every subsequent pass; it is
/// never a terminal failure, since capacity may appear at any time.
pub struct ProvisioningRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    clusters: Arc<dyn ClusterStore>,
    placement: Arc<dyn PlacementStrategy>,
    data_plane: Arc<dyn DataPlaneService>,
    config: RequestConfig,
}

impl ProvisioningRequestManager {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        clusters: Arc<dyn ClusterStore>,
        placement: Arc<dyn PlacementStrategy>,
        data_plane: Arc<dyn DataPlaneService>,
        config: RequestConfig,
    ) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_PROVISIONING),
            requests,
            clusters,
            placement,
            data_plane,
            config,
        }
    }

    async fn handle(&self, request: &mut StreamRequest) -> Result<(), ServiceError> {
        match &request.cluster_id {
            None => self.replace_cluster(request).await?,
            Some(cluster_id) if request.desired_stream_version.is_none() => {
                self.refresh_versions(cluster_id.clone(), request).await?;
            }
            Some(_) => {}
        }

        if self.config.data_plane_sync_enabled {
            // promotion to ready is owned by the data-plane sync path
            return Ok(());
        }

        match self.data_plane.instance_state(request).await? {
            InstanceState::Ready => {
                request.status = RequestStatus::Ready;
                self.requests.update(request).await?;
                info!(request_id = %request.id, "instance is up, moving to ready");
            }
            InstanceState::Error => {
                return Err(ServiceError::General(format!(
                    "instance for request {} reported an error state",
                    request.id
                )));
            }
            InstanceState::Installing | InstanceState::Unknown => {
                debug!(
                    request_id = %request.id,
                    "instance not up yet, retrying next pass"
                );
            }
        }
        Ok(())
    }

    async fn replace_cluster(&self, request: &mut StreamRequest) -> Result<(), ServiceError> {
        let Some(cluster) = self.placement.find_cluster(request).await? else {
            return Err(ServiceError::General(format!(
                "no cluster available to re-place request {}",
                request.id
            )));
        };

        let Some(version) = cluster.latest_available_and_ready_stream_version() else {
            return Err(ServiceError::General(format!(
                "no ready stream version on cluster {} for request {}",
                cluster.cluster_id, request.id
            )));
        };

        request.desired_stream_version = Some(version.version.clone());
        request.desired_operator_version = version.operator_version.clone();
        request.cluster_id = Some(cluster.cluster_id);
        self.requests.update(request).await?;
        info!(
            request_id = %request.id,
            cluster_id = request.cluster_id.as_deref().unwrap_or_default(),
            "request re-placed"
        );
        Ok(())
    }

    /// Re-derive the desired versions from the already-assigned cluster.
    async fn refresh_versions(
        &self,
        cluster_id: String,
        request: &mut StreamRequest,
    ) -> Result<(), ServiceError> {
        let Some(cluster) = self.clusters.find_cluster_by_id(&cluster_id).await? else {
            return Err(ServiceError::General(format!(
                "cluster {} assigned to request {} no longer exists",
                cluster_id, request.id
            )));
        };

        let Some(version) = cluster.latest_available_and_ready_stream_version() else {
            return Err(ServiceError::General(format!(
                "no ready stream version on cluster {} for request {}",
                cluster_id, request.id
            )));
        };

        request.desired_stream_version = Some(version.version.clone());
        request.desired_operator_version = version.operator_version.clone();
        self.requests.update(request).await?;
        Ok(())
    }
}

#[async_trait]
impl Worker for ProvisioningRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Provisioning])
            .await
        {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let mut errors = Vec::new();
        for mut request in requests {
            if let Err(err) = self.handle(&mut request).await {
                errors.push(err);
            }
        }
        errors
    }
}
