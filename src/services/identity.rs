//! Identity-provider contract for per-instance service accounts.

use crate::error::Result;
use async_trait::async_trait;

/// Credentials issued for an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub client_id: String,
    pub secret: String,
}

/// Issues service accounts for provisioned instances.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create-or-fetch the service account identified by `prefix` and the
    /// request id. Idempotent: repeated calls return the same account.
    async fn ensure_service_account(
        &self,
        prefix: &str,
        request_id: &str,
    ) -> Result<ServiceAccount>;
}
