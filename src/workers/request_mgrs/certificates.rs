//! Worker converging TLS material for running instances. Purely additive;
//! no state-machine transition.

use crate::constants::WORKER_TYPE_CERTIFICATES;
use crate::error::ServiceError;
use crate::models::RequestStatus;
use crate::services::network::NetworkService;
use crate::services::requests::RequestStore;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Ensures every ready request has a stored TLS certificate reference.
pub struct CertificateRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    network: Arc<dyn NetworkService>,
}

impl CertificateRequestManager {
    pub fn new(requests: Arc<dyn RequestStore>, network: Arc<dyn NetworkService>) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_CERTIFICATES),
            requests,
            network,
        }
    }
}

#[async_trait]
impl Worker for CertificateRequestManager {
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
            if request.tls_certificate_ref.is_some() {
                continue;
            }
            match self.network.ensure_certificate(&request).await {
                Ok(certificate_ref) => {
                    request.tls_certificate_ref = Some(certificate_ref);
                    if let Err(err) = self.requests.update(&request).await {
                        errors.push(err);
                    } else {
                        info!(request_id = %request.id, "certificate converged");
                    }
                }
                Err(err) => errors.push(err),
            }
        }
        errors
    }
}
