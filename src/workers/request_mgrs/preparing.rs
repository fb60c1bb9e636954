//! Worker for `preparing` requests: external preparation of supporting
//! credentials and records.

use crate::config::RequestConfig;
use crate::constants::WORKER_TYPE_PREPARING;
use crate::error::ServiceError;
use crate::models::{RequestStatus, StreamRequest};
use crate::services::data_plane::DataPlaneService;
use crate::services::requests::RequestStore;
use crate::workers::request_mgrs::handle_creation_error;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Prepares requests for provisioning on the data plane.
///
/// Preparation registers the supporting credentials and records the data
/// plane needs; it is safe to repeat, so a failed pass leaves the request in
/// `preparing` for retry (bounded by the creation-error window). When the
/// data plane reports instance status back to the control plane, the request
/// stays in `preparing` until that sync path promotes it; otherwise this
/// worker advances it to `provisioning` directly.
pub struct PreparingRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    data_plane: Arc<dyn DataPlaneService>,
    config: RequestConfig,
}

impl PreparingRequestManager {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        data_plane: Arc<dyn DataPlaneService>,
        config: RequestConfig,
    ) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_PREPARING),
            requests,
            data_plane,
            config,
        }
    }

    async fn handle(&self, request: &mut StreamRequest) -> Result<(), ServiceError> {
        if let Err(err) = self.data_plane.prepare_request(request).await {
            return Err(handle_creation_error(
                self.requests.as_ref(),
                request,
                err,
                self.config.max_duration_with_provisioning_errs(),
            )
            .await);
        }

        if !self.config.data_plane_sync_enabled {
            request.status = RequestStatus::Provisioning;
            self.requests.update(request).await?;
            info!(
                request_id = %request.id,
                "request prepared, moving to provisioning"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for PreparingRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Preparing])
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
