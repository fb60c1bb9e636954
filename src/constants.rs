//! Shared constants for worker types, scheduling cadences and retry windows.

use std::time::Duration;

/// Worker type owning the `accepted` request status.
pub const WORKER_TYPE_ACCEPTED: &str = "accepted_stream_request";
/// Worker type owning the `preparing` request status.
pub const WORKER_TYPE_PREPARING: &str = "preparing_stream_request";
/// Worker type owning the `provisioning` request status.
pub const WORKER_TYPE_PROVISIONING: &str = "provisioning_stream_request";
/// Worker type owning the `ready` request status.
pub const WORKER_TYPE_READY: &str = "ready_stream_request";
/// Worker type owning the `failed` request status.
pub const WORKER_TYPE_FAILED: &str = "failed_stream_request";
/// Worker type owning the `deleting`/`deprovision` request statuses.
pub const WORKER_TYPE_DELETING: &str = "deleting_stream_request";
/// Worker type converging bootstrap DNS records.
pub const WORKER_TYPE_ROUTES: &str = "stream_request_routes";
/// Worker type converging TLS material.
pub const WORKER_TYPE_CERTIFICATES: &str = "stream_request_certificates";
/// Worker type for fleet-wide request housekeeping (expiration, suspension).
pub const WORKER_TYPE_GENERAL: &str = "stream_request";

/// Every worker type that must have a seeded leader lease row.
pub const ALL_WORKER_TYPES: &[&str] = &[
    WORKER_TYPE_ACCEPTED,
    WORKER_TYPE_PREPARING,
    WORKER_TYPE_PROVISIONING,
    WORKER_TYPE_READY,
    WORKER_TYPE_FAILED,
    WORKER_TYPE_DELETING,
    WORKER_TYPE_ROUTES,
    WORKER_TYPE_CERTIFICATES,
    WORKER_TYPE_GENERAL,
];

/// How often the leader election manager re-evaluates leadership.
pub const DEFAULT_LEADER_POLLING_INTERVAL: Duration = Duration::from_secs(15);
/// How far into the future a claimed or renewed lease expires.
pub const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(60);
/// How close to expiry the current leader starts renewing its lease.
pub const DEFAULT_LEASE_RENEW_AHEAD: Duration = Duration::from_secs(30);

/// Cadence of a worker's periodic reconciliation pass.
pub const DEFAULT_RECONCILER_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum time a request may keep hitting server-class errors on the
/// creation path before it is marked failed.
pub const MAX_DURATION_WITH_PROVISIONING_ERRS: Duration = Duration::from_secs(5 * 60);
/// Maximum time an accepted request may wait for a cluster assignment.
pub const ACCEPTED_MAX_RETRY_WAITING_FOR_CLUSTER: Duration = Duration::from_secs(60 * 60);
/// Maximum time an accepted request may wait for a ready stream version on
/// its assigned cluster (versions may be briefly unavailable during operator
/// upgrades).
pub const ACCEPTED_MAX_RETRY_WAITING_FOR_STREAM_VERSION: Duration = Duration::from_secs(60 * 60);

/// Signal bus topic a reconciler listens on for out-of-band wakeups.
pub fn reconcile_topic(worker_type: &str) -> String {
    format!("reconcile:{worker_type}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_worker_types_are_distinct() {
        let mut types: Vec<&str> = ALL_WORKER_TYPES.to_vec();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), ALL_WORKER_TYPES.len());
    }

    #[test]
    fn reconcile_topic_is_scoped_per_worker_type() {
        assert_eq!(
            reconcile_topic(WORKER_TYPE_ACCEPTED),
            "reconcile:accepted_stream_request"
        );
    }
}
