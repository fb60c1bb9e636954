//! Quota/subscription contract. Billing internals live outside this core.

use crate::error::Result;
use crate::models::StreamRequest;
use async_trait::async_trait;

/// Reserves and releases subscription quota for stream requests.
#[async_trait]
pub trait QuotaService: Send + Sync {
    /// Reserve quota for the request and return the subscription id.
    ///
    /// Idempotent per request: reserving again for the same request id
    /// yields the same subscription id. Exhausted quota is reported as
    /// [`crate::error::ServiceError::InsufficientQuota`].
    async fn reserve(&self, request: &StreamRequest) -> Result<String>;

    /// Release a previously reserved subscription. Releasing an unknown or
    /// already-released subscription is a no-op.
    async fn release(&self, subscription_id: &str) -> Result<()>;
}
