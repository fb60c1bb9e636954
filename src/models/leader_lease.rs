//! # Leader Lease Model
//!
//! A leader lease is a persisted, time-bounded exclusive claim on the right
//! to run a given worker type. Exactly one non-deleted row exists per
//! `lease_type`; rows are seeded by migration and only ever updated (leader,
//! expires) by whichever process currently holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `leader_leases` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LeaderLease {
    pub id: Uuid,
    /// Identifies the worker type this lease arbitrates, e.g.
    /// `accepted_stream_request`.
    pub lease_type: String,
    /// Instance id of the worker currently recorded as leader; empty when
    /// the lease has never been claimed.
    pub leader: String,
    pub expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LeaderLease {
    /// Whether the lease no longer grants anyone leadership.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.leader.is_empty() || self.expires <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn lease(leader: &str, expires: DateTime<Utc>) -> LeaderLease {
        let now = Utc::now();
        LeaderLease {
            id: Uuid::new_v4(),
            lease_type: "cluster".to_string(),
            leader: leader.to_string(),
            expires,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn unclaimed_lease_is_expired() {
        let now = Utc::now();
        assert!(lease("", now + Duration::minutes(5)).is_expired(now));
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = Utc::now();
        assert!(lease("worker-a", now - Duration::seconds(1)).is_expired(now));
        assert!(!lease("worker-a", now + Duration::seconds(1)).is_expired(now));
    }
}
