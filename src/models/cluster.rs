//! # Cluster Model
//!
//! Backing data-plane clusters. The reconciliation core only references
//! clusters by id as the target of placement; cluster provisioning itself is
//! owned by a separate control loop outside this core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a backing cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    Accepted,
    Provisioning,
    Provisioned,
    WaitingForFleetAgent,
    Ready,
    Deprovisioning,
    Cleanup,
    Failed,
    Full,
}

/// Ordinals used to decide if a status comes after or before a given state.
fn ordinal(status: ClusterStatus) -> i32 {
    match status {
        ClusterStatus::Accepted => 0,
        ClusterStatus::Provisioning => 10,
        ClusterStatus::Provisioned => 20,
        ClusterStatus::WaitingForFleetAgent => 30,
        ClusterStatus::Ready => 40,
        ClusterStatus::Deprovisioning => 50,
        ClusterStatus::Cleanup => 60,
        ClusterStatus::Failed => 70,
        // Full clusters are still ready; they just cannot accept placements.
        ClusterStatus::Full => 40,
    }
}

impl ClusterStatus {
    /// Compare this status with the given status. The result is 0 if
    /// `self == other`, -1 if `self` comes before `other`, and +1 if it
    /// comes after.
    pub fn compare_to(&self, other: ClusterStatus) -> i32 {
        let (a, b) = (ordinal(*self), ordinal(other));
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Accepted => "cluster_accepted",
            ClusterStatus::Provisioning => "cluster_provisioning",
            ClusterStatus::Provisioned => "cluster_provisioned",
            ClusterStatus::WaitingForFleetAgent => "waiting_for_fleet_agent",
            ClusterStatus::Ready => "ready",
            ClusterStatus::Deprovisioning => "deprovisioning",
            ClusterStatus::Cleanup => "cleanup",
            ClusterStatus::Failed => "failed",
            ClusterStatus::Full => "full",
        }
    }

    pub fn parse(s: &str) -> Option<ClusterStatus> {
        match s {
            "cluster_accepted" => Some(ClusterStatus::Accepted),
            "cluster_provisioning" => Some(ClusterStatus::Provisioning),
            "cluster_provisioned" => Some(ClusterStatus::Provisioned),
            "waiting_for_fleet_agent" => Some(ClusterStatus::WaitingForFleetAgent),
            "ready" => Some(ClusterStatus::Ready),
            "deprovisioning" => Some(ClusterStatus::Deprovisioning),
            "cleanup" => Some(ClusterStatus::Cleanup),
            "failed" => Some(ClusterStatus::Failed),
            "full" => Some(ClusterStatus::Full),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform version installed on a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVersion {
    pub version: String,
    pub ready: bool,
    /// Operator version shipping this platform version.
    #[serde(default)]
    pub operator_version: Option<String>,
}

/// A backing data-plane cluster, referenced by placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub cluster_id: String,
    pub cloud_provider: String,
    pub region: String,
    pub multi_az: bool,
    pub status: ClusterStatus,
    /// Platform versions available on this cluster, sorted ascending by the
    /// data-plane sync path.
    pub available_stream_versions: Vec<StreamVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    /// The newest platform version that is both installed and reported ready
    /// on this cluster, if any. Versions may all be briefly unready during
    /// operator upgrades.
    pub fn latest_available_and_ready_stream_version(&self) -> Option<&StreamVersion> {
        self.available_stream_versions.iter().rev().find(|v| v.ready)
    }
}
