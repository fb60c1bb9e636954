//! Worker for `ready` requests: converges per-instance credentials that are
//! only meaningful once provisioning has produced a stable identity.

use crate::constants::WORKER_TYPE_READY;
use crate::error::ServiceError;
use crate::models::RequestStatus;
use crate::services::identity::IdentityService;
use crate::services::requests::RequestStore;
use crate::workers::request_mgrs::ensure_credentials;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;

/// Issues missing service-account and canary credentials for running
/// instances. Purely create-if-missing; no state-machine transition.
pub struct ReadyRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    identity: Arc<dyn IdentityService>,
}

impl ReadyRequestManager {
    pub fn new(requests: Arc<dyn RequestStore>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_READY),
            requests,
            identity,
        }
    }
}

#[async_trait]
impl Worker for ReadyRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self
            .requests
            .list_by_statuses(&[RequestStatus::Ready])
            .await
        {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let mut errors = Vec::new();
        for mut request in requests {
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
