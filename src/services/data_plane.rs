//! Data-plane contract: request preparation and instance state observation.
//! Manifest construction and agent communication live outside this core.

use crate::error::Result;
use crate::models::StreamRequest;
use async_trait::async_trait;

/// Observed state of an instance on the data plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Installing,
    Ready,
    Error,
    Unknown,
}

/// External data-plane operations invoked by the lifecycle workers.
#[async_trait]
pub trait DataPlaneService: Send + Sync {
    /// Register the supporting credentials and records a request needs
    /// before the data plane can provision it. Safe to repeat.
    async fn prepare_request(&self, request: &StreamRequest) -> Result<()>;

    /// Observe the current state of the instance backing a request.
    async fn instance_state(&self, request: &StreamRequest) -> Result<InstanceState>;
}
