//! Fleet-wide request housekeeping: expiration-driven deprovisioning and
//! grace-period suspension.

use crate::config::RequestConfig;
use crate::constants::WORKER_TYPE_GENERAL;
use crate::error::ServiceError;
use crate::models::{RequestStatus, StreamRequest};
use crate::services::requests::RequestStore;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Deprovisions expired instances and suspends instances that entered their
/// grace period. Both actions are config-gated and skipped entirely when
/// expired-request deletion is disabled.
pub struct StreamRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    config: RequestConfig,
}

impl StreamRequestManager {
    pub fn new(requests: Arc<dyn RequestStore>, config: RequestConfig) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_GENERAL),
            requests,
            config,
        }
    }

    async fn handle(
        &self,
        request: &StreamRequest,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if request.expires_at.is_none() {
            return Ok(());
        }

        if request.is_expired(now) {
            // already past the teardown stages, nothing to do
            if request.status.compare_to(RequestStatus::Deprovision) >= 0 {
                return Ok(());
            }
            if self
                .requests
                .update_status(&request.id, RequestStatus::Deprovision)
                .await?
            {
                info!(
                    request_id = %request.id,
                    "instance expired, moving to deprovision"
                );
            }
            return Ok(());
        }

        if self.config.grace_period_days > 0
            && request.can_be_suspended()
            && request
                .remaining_lifespan_days(now)
                .is_some_and(|days| days <= self.config.grace_period_days)
        {
            if self
                .requests
                .update_status(&request.id, RequestStatus::Suspending)
                .await?
            {
                info!(
                    request_id = %request.id,
                    "instance entered its grace period, suspending"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for StreamRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        if !self.config.enable_deletion_of_expired_requests {
            return Vec::new();
        }

        let requests = match self.requests.list_all().await {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let now = Utc::now();
        let mut errors = Vec::new();
        for request in requests {
            if let Err(err) = self.handle(&request, now).await {
                errors.push(err);
            }
        }
        errors
    }
}
