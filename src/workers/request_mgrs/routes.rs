//! Worker converging bootstrap DNS records. Purely additive; no
//! state-machine transition.

use crate::constants::WORKER_TYPE_ROUTES;
use crate::error::ServiceError;
use crate::services::network::NetworkService;
use crate::services::requests::RequestStore;
use crate::workers::{BaseWorker, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Ensures every placed request has its bootstrap DNS record.
pub struct RoutesRequestManager {
    base: BaseWorker,
    requests: Arc<dyn RequestStore>,
    network: Arc<dyn NetworkService>,
}

impl RoutesRequestManager {
    pub fn new(requests: Arc<dyn RequestStore>, network: Arc<dyn NetworkService>) -> Self {
        Self {
            base: BaseWorker::new(WORKER_TYPE_ROUTES),
            requests,
            network,
        }
    }
}

#[async_trait]
impl Worker for RoutesRequestManager {
    fn base(&self) -> &BaseWorker {
        &self.base
    }

    async fn reconcile(&self) -> Vec<ServiceError> {
        let requests = match self.requests.list_all().await {
            Ok(requests) => requests,
            Err(err) => return vec![err],
        };

        let mut errors = Vec::new();
        for mut request in requests {
            if request.cluster_id.is_none() || request.routes_created {
                continue;
            }
            match self.network.ensure_bootstrap_record(&request).await {
                Ok(bootstrap_url) => {
                    request.bootstrap_url = Some(bootstrap_url);
                    request.routes_created = true;
                    if let Err(err) = self.requests.update(&request).await {
                        errors.push(err);
                    } else {
                        info!(
                            request_id = %request.id,
                            bootstrap_url = request.bootstrap_url.as_deref().unwrap_or_default(),
                            "bootstrap record created"
                        );
                    }
                }
                Err(err) => errors.push(err),
            }
        }
        errors
    }
}
