//! Worker for `accepted` requests: placement, version selection and quota
//! reservation, then advancement to `preparing`.

use crate::config::RequestConfig;
use crate::constants::WORKER_TYPE_ACCEPTED;
use crate::error::ServiceError;
use crate::models::{RequestStatus, StreamRequest};
use crate::services::placement::PlacementStrategy;
use crate::services::quota::QuotaService;
use crate::services::requests::RequestStore;
use crate::workers::request_mgrs::handle_creation_error;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Drives `accepted` requests to `preparing`.
///
/// A request without an assignable cluster or without a ready platform
/// version is left untouched and retried next pass, until the matching wait
/// window (default 1h each) is exhausted, at which point it is failed.
/// Quota reservation is idempotent per request, guarded by the presence of
/// `subscription_id`; an insufficient-quota response fails the request
/// immediately.
pub struct AcceptedRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    placement: Arc<dyn PlacementStrategy>,
    quota: Arc<dyn QuotaService>,
    config: RequestConfig,
}

impl AcceptedRequestManager {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        placement: Arc<dyn PlacementStrategy>,
        quota: Arc<dyn QuotaService>,
        config: RequestConfig,
    ) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_ACCEPTED),
            requests,
            placement,
            quota,
            config,
        }
    }

    async fn handle(&self, request: &mut StreamRequest) -> Result<(), ServiceError> {
        if request.cluster_id.is_none() && !self.assign_cluster(request).await? {
            // still waiting for a cluster or a ready version
            return Ok(());
        }

        if self.config.quota_enabled && request.subscription_id.is_none() {
            match self.quota.reserve(request).await {
                Ok(subscription_id) => {
                    request.subscription_id = Some(subscription_id);
                }
                Err(err) if err.is_insufficient_quota() => {
                    info!(
                        request_id = %request.id,
                        "insufficient quota, marking request as failed"
                    );
                    request.fail(err.reason());
                    self.requests.update(request).await?;
                    return Err(err);
                }
                Err(err) => {
                    return Err(handle_creation_error(
                        self.requests.as_ref(),
                        request,
                        err,
                        self.config.max_duration_with_provisioning_errs(),
                    )
                    .await);
                }
            }
        }

        request.status = RequestStatus::Preparing;
        self.requests.update(request).await?;
        info!(
            request_id = %request.id,
            cluster_id = request.cluster_id.as_deref().unwrap_or_default(),
            "request accepted, moving to preparing"
        );
        Ok(())
    }

    /// Run placement and derive the desired versions from the assigned
    /// cluster. Returns whether the request is now placed; an unplaced
    /// request is either left for the next pass or failed once its wait
    /// window is exhausted.
    async fn assign_cluster(&self, request: &mut StreamRequest) -> Result<bool, ServiceError> {
        let now = Utc::now();

        let Some(cluster) = self.placement.find_cluster(request).await? else {
            if request.age(now)
                >= chrono::Duration::seconds(
                    self.config.cluster_assignment_retry().as_secs() as i64
                )
            {
                request.fail("waiting for cluster assignment timed out");
                self.requests.update(request).await?;
            } else {
                debug!(
                    request_id = %request.id,
                    "no cluster available yet, retrying next pass"
                );
            }
            return Ok(false);
        };

        let Some(version) = cluster.latest_available_and_ready_stream_version() else {
            if request.age(now)
                >= chrono::Duration::seconds(self.config.stream_version_retry().as_secs() as i64)
            {
                request.fail("waiting for a ready stream version timed out");
                self.requests.update(request).await?;
            } else {
                debug!(
                    request_id = %request.id,
                    cluster_id = %cluster.cluster_id,
                    "no ready stream version on the assigned cluster, retrying next pass"
                );
            }
            return Ok(false);
        };

        request.desired_stream_version = Some(version.version.clone());
        request.desired_operator_version = version.operator_version.clone();
        request.cluster_id = Some(cluster.cluster_id);
        Ok(true)
    }
}

#[async_trait]
impl Worker for AcceptedRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Accepted])
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
