//! Worker tearing down requests: `deleting` requests, plus `deprovision`
//! requests that never reached real provisioning on the data plane.

use crate::config::RequestConfig;
use crate::constants::WORKER_TYPE_DELETING;
use crate::error::ServiceError;
use crate::models::{RequestStatus, StreamRequest};
use crate::services::quota::QuotaService;
use crate::services::requests::RequestStore;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Releases quota and soft-deletes torn-down requests.
///
/// Both steps are safe to repeat: releasing an unknown subscription is a
/// no-op, and so is deleting an already-deleted request. Partial failure is
/// reported and the request is retried whole on the next pass.
pub struct DeletingRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    quota: Arc<dyn QuotaService>,
    config: RequestConfig,
}

impl DeletingRequestManager {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        quota: Arc<dyn QuotaService>,
        config: RequestConfig,
    ) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_DELETING),
            requests,
            quota,
            config,
        }
    }

    async fn handle(&self, request: &StreamRequest) -> Result<(), ServiceError> {
        if self.config.quota_enabled {
            if let Some(subscription_id) = &request.subscription_id {
                self.quota.release(subscription_id).await?;
            }
        }
        self.requests.delete(&request.id).await?;
        info!(request_id = %request.id, "request deleted");
        Ok(())
    }
}

#[async_trait]
impl Worker for DeletingRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Deleting, RequestStatus::Deprovision])
            .await
        {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let mut errors = Vec::new();
        for request in requests {
            // deprovision requests with a provisioned instance are torn down
            // by the data plane first and arrive here as deleting
            if request.status == RequestStatus::Deprovision && request.was_provisioned() {
                continue;
            }
            if let Err(err) = self.handle(&request).await {
                errors.push(err);
            }
        }
        errors
    }
}
