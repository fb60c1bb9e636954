//! # Stream Request Model
//!
//! The reconciled business entity: a request for a managed streaming-platform
//! instance. Requests are created in `accepted` by the intake path and then
//! mutated exclusively by the lifecycle workers, each of which owns exactly
//! one status. The status enum carries a total order via ordinals so callers
//! can ask whether one state comes before or after another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Accepted,
    Preparing,
    Provisioning,
    Ready,
    Suspending,
    Suspended,
    Resuming,
    Deprovision,
    Deleting,
    Failed,
}

/// Ordinals used to decide if a status comes after or before a given state.
fn ordinal(status: RequestStatus) -> i32 {
    match status {
        RequestStatus::Accepted => 0,
        RequestStatus::Preparing => 10,
        RequestStatus::Provisioning => 20,
        RequestStatus::Ready => 30,
        RequestStatus::Suspending => 31,
        RequestStatus::Suspended => 32,
        RequestStatus::Resuming => 33,
        RequestStatus::Deprovision => 40,
        RequestStatus::Deleting => 50,
        RequestStatus::Failed => 500,
    }
}

impl RequestStatus {
    /// Compare this status with the given status. The result is 0 if
    /// `self == other`, -1 if `self` comes before `other`, and +1 if it
    /// comes after.
    pub fn compare_to(&self, other: RequestStatus) -> i32 {
        let (a, b) = (ordinal(*self), ordinal(other));
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Accepted => "accepted",
            RequestStatus::Preparing => "preparing",
            RequestStatus::Provisioning => "provisioning",
            RequestStatus::Ready => "ready",
            RequestStatus::Suspending => "suspending",
            RequestStatus::Suspended => "suspended",
            RequestStatus::Resuming => "resuming",
            RequestStatus::Deprovision => "deprovision",
            RequestStatus::Deleting => "deleting",
            RequestStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<RequestStatus> {
        match s {
            "accepted" => Some(RequestStatus::Accepted),
            "preparing" => Some(RequestStatus::Preparing),
            "provisioning" => Some(RequestStatus::Provisioning),
            "ready" => Some(RequestStatus::Ready),
            "suspending" => Some(RequestStatus::Suspending),
            "suspended" => Some(RequestStatus::Suspended),
            "resuming" => Some(RequestStatus::Resuming),
            "deprovision" => Some(RequestStatus::Deprovision),
            "deleting" => Some(RequestStatus::Deleting),
            "failed" => Some(RequestStatus::Failed),
            _ => None,
        }
    }

    /// Every status, for fleet-wide listings.
    pub fn all() -> &'static [RequestStatus] {
        &[
            RequestStatus::Accepted,
            RequestStatus::Preparing,
            RequestStatus::Provisioning,
            RequestStatus::Ready,
            RequestStatus::Suspending,
            RequestStatus::Suspended,
            RequestStatus::Resuming,
            RequestStatus::Deprovision,
            RequestStatus::Deleting,
            RequestStatus::Failed,
        ]
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for a managed streaming-platform instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub status: RequestStatus,
    pub cloud_provider: String,
    pub region: String,
    pub multi_az: bool,
    pub instance_type: String,
    /// Backing cluster chosen by placement; set no later than the request
    /// leaves `accepted`.
    pub cluster_id: Option<String>,
    pub subscription_id: Option<String>,
    pub failed_reason: Option<String>,
    /// Desired platform version, derived from the assigned cluster's latest
    /// available and ready version during acceptance.
    pub desired_stream_version: Option<String>,
    pub desired_operator_version: Option<String>,
    /// Bootstrap host converged by the routes worker once the request is
    /// placed.
    pub bootstrap_url: Option<String>,
    pub routes_created: bool,
    pub tls_certificate_ref: Option<String>,
    pub service_account_client_id: Option<String>,
    pub service_account_secret: Option<String>,
    pub canary_service_account_client_id: Option<String>,
    pub canary_service_account_secret: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StreamRequest {
    /// A minimal accepted request, used by the intake path and tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            status: RequestStatus::Accepted,
            cloud_provider: "aws".to_string(),
            region: "us-east-1".to_string(),
            multi_az: true,
            instance_type: "standard".to_string(),
            cluster_id: None,
            subscription_id: None,
            failed_reason: None,
            desired_stream_version: None,
            desired_operator_version: None,
            bootstrap_url: None,
            routes_created: false,
            tls_certificate_ref: None,
            service_account_client_id: None,
            service_account_secret: None,
            canary_service_account_client_id: None,
            canary_service_account_secret: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Whether the instance has outlived its configured lifespan.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Days until expiry, when a lifespan is configured.
    pub fn remaining_lifespan_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|at| (at - now).num_days())
    }

    /// Only running instances are eligible for automatic suspension.
    pub fn can_be_suspended(&self) -> bool {
        matches!(
            self.status,
            RequestStatus::Ready | RequestStatus::Resuming
        )
    }

    /// Whether the request reached real provisioning on the data plane. A
    /// deprovision request without a bootstrap host never did, and can be
    /// torn down directly by the deleting worker.
    pub fn was_provisioned(&self) -> bool {
        self.bootstrap_url.is_some()
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RequestStatus::Failed;
        self.failed_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_ordinals_are_totally_ordered() {
        assert!(RequestStatus::Accepted.compare_to(RequestStatus::Preparing) < 0);
        assert!(RequestStatus::Preparing.compare_to(RequestStatus::Provisioning) < 0);
        assert!(RequestStatus::Provisioning.compare_to(RequestStatus::Ready) < 0);
        assert!(RequestStatus::Ready.compare_to(RequestStatus::Accepted) > 0);
        assert!(RequestStatus::Deprovision.compare_to(RequestStatus::Ready) > 0);
        assert!(RequestStatus::Deleting.compare_to(RequestStatus::Deprovision) > 0);
        assert!(RequestStatus::Failed.compare_to(RequestStatus::Deleting) > 0);
    }

    #[test]
    fn suspend_branch_sits_between_ready_and_deprovision() {
        assert!(RequestStatus::Suspending.compare_to(RequestStatus::Ready) > 0);
        assert!(RequestStatus::Suspended.compare_to(RequestStatus::Suspending) > 0);
        assert!(RequestStatus::Resuming.compare_to(RequestStatus::Deprovision) < 0);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in RequestStatus::all() {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }

    proptest! {
        #[test]
        fn compare_to_is_reflexive_and_antisymmetric(
            a in prop::sample::select(RequestStatus::all().to_vec()),
            b in prop::sample::select(RequestStatus::all().to_vec()),
        ) {
            prop_assert_eq!(a.compare_to(a), 0);
            prop_assert_eq!(a.compare_to(b), -b.compare_to(a));
        }
    }

    #[test]
    fn failing_a_request_records_the_reason() {
        let mut request = StreamRequest::new("id", "name", "owner");
        request.fail("insufficient quota");
        assert_eq!(request.status, RequestStatus::Failed);
        assert_eq!(request.failed_reason.as_deref(), Some("insufficient quota"));
    }

    #[test]
    fn expiry_and_suspension_eligibility() {
        let now = Utc::now();
        let mut request = StreamRequest::new("id", "name", "owner");
        assert!(!request.is_expired(now));
        request.expires_at = Some(now - chrono::Duration::hours(1));
        assert!(request.is_expired(now));

        request.status = RequestStatus::Ready;
        assert!(request.can_be_suspended());
        request.status = RequestStatus::Suspended;
        assert!(!request.can_be_suspended());
    }
}
