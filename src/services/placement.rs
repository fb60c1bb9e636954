//! Cluster placement contract. The scoring algorithm (provider/region fit,
//! capacity, multi-AZ support) lives outside this core; workers only depend
//! on this seam.

use crate::error::Result;
use crate::models::{Cluster, StreamRequest};
use async_trait::async_trait;

/// Chooses a target cluster for a stream request.
#[async_trait]
pub trait PlacementStrategy: Send + Sync {
    /// Find a cluster able to host the request, or `None` when no cluster
    /// currently fits (a normal outcome, retried on the next pass).
    /// Deterministic enough to be safely re-invoked for the same request.
    async fn find_cluster(&self, request: &StreamRequest) -> Result<Option<Cluster>>;
}
