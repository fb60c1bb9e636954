//! Worker for `failed` requests.
//!
//! Failed instances keep their auxiliary credentials converged so an
//! operator-driven retry (moving a request back into the live path) does not
//! start from a half-issued identity.

use crate::constants::WORKER_TYPE_FAILED;
use crate::error::ServiceError;
use crate::models::RequestStatus;
use crate::services::identity::IdentityService;
use crate::services::requests::RequestStore;
use crate::workers::request_mgrs::ensure_credentials;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;

/// Converges credentials for requests parked in `failed`.
pub struct FailedRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    identity: Arc<dyn IdentityService>,
}

impl FailedRequestManager {
    pub fn new(requests: Arc<dyn RequestStore>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_FAILED),
            requests,
            identity,
        }
    }
}

#[async_trait]
impl Worker for FailedRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Failed])
            .await
        {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let mut errors = Vec::new();
        for mut request in requests {
            // credentials only make sense once the instance was actually
            // provisioned at some point
            if !request.was_provisioned() {
                continue;
            }
            match ensure_credentials(self.identity.as_ref(), &mut request).await {
                Ok(true) => {
                    if let Err(err) = self.requests.update(&request).await {
                        errors.push(err);
                    }
                }
                Ok(false) => {}
                Err(err) => errors.push(err),
            }
        }
        errors
    }
}
