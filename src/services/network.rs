//! Network-resource contract: bootstrap DNS records and TLS material.
//! The DNS provider and certificate authority integrations live outside
//! this core.

use crate::error::Result;
use crate::models::StreamRequest;
use async_trait::async_trait;

/// Converges derived network resources for stream requests.
#[async_trait]
pub trait NetworkService: Send + Sync {
    /// Ensure the bootstrap DNS record for the request exists and return
    /// the bootstrap host. Safe to repeat.
    async fn ensure_bootstrap_record(&self, request: &StreamRequest) -> Result<String>;

    /// Ensure TLS material for the request exists and return a reference to
    /// the stored certificate. Safe to repeat.
    async fn ensure_certificate(&self, request: &StreamRequest) -> Result<String>;
}
