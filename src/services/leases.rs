//! # Lease Store
//!
//! Storage access for leader leases. The one operation with teeth is
//! [`LeaseStore::try_claim`]: an attempt to take an exclusive claim on a
//! single lease row *without blocking* when another acquirer already holds
//! it. In Postgres that is `SELECT ... FOR UPDATE SKIP LOCKED` inside a
//! transaction; any storage engine with an equivalent non-blocking
//! conditional-lock (or a compare-and-swap) satisfies the same contract.

use crate::error::{Result, ServiceError};
use crate::models::LeaderLease;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Outcome of a non-blocking claim attempt on a lease row.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaseClaim {
    /// The caller locked the row and now holds the lease until `expires`.
    Claimed(LeaderLease),
    /// Another acquirer holds the row lock right now; the caller skipped
    /// rather than queuing.
    Contended,
    /// The row was lockable but a competitor re-claimed the lease between
    /// the caller's unlocked read and the lock.
    Lost(LeaderLease),
}

/// Storage contract for leader leases.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Read the lease row for a worker type without locking it.
    async fn find_by_lease_type(&self, lease_type: &str) -> Result<Option<LeaderLease>>;

    /// Attempt to claim or renew the lease for `leader`, without blocking on
    /// contention. The claim only succeeds while the row is either expired
    /// or already owned by `leader`.
    async fn try_claim(
        &self,
        lease_type: &str,
        leader: &str,
        expires: DateTime<Utc>,
    ) -> Result<LeaseClaim>;
}

/// Postgres-backed lease store.
pub struct PostgresLeaseStore {
    pool: PgPool,
}

impl PostgresLeaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaseStore for PostgresLeaseStore {
    async fn find_by_lease_type(&self, lease_type: &str) -> Result<Option<LeaderLease>> {
        let lease = sqlx::query_as::<_, LeaderLease>(
            "SELECT * FROM leader_leases WHERE deleted_at IS NULL AND lease_type = $1 LIMIT 1",
        )
        .bind(lease_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lease)
    }

    async fn try_claim(
        &self,
        lease_type: &str,
        leader: &str,
        expires: DateTime<Utc>,
    ) -> Result<LeaseClaim> {
        let mut tx = self.pool.begin().await?;

        // SKIP LOCKED turns row contention into an immediate miss instead of
        // a queued wait; a concurrent acquirer simply fails this step.
        let locked = sqlx::query_as::<_, LeaderLease>(
            "SELECT * FROM leader_leases \
             WHERE deleted_at IS NULL AND lease_type = $1 \
             FOR UPDATE SKIP LOCKED LIMIT 1",
        )
        .bind(lease_type)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(lease) = locked else {
            tx.rollback().await?;
            return Ok(LeaseClaim::Contended);
        };

        let now = Utc::now();
        if !lease.is_expired(now) && lease.leader != leader {
            // A competitor claimed and committed between our unlocked read
            // and this lock.
            tx.rollback().await?;
            return Ok(LeaseClaim::Lost(lease));
        }

        sqlx::query(
            "UPDATE leader_leases SET leader = $1, expires = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(leader)
        .bind(expires)
        .bind(now)
        .bind(lease.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LeaseClaim::Claimed(LeaderLease {
            leader: leader.to_string(),
            expires,
            updated_at: now,
            ..lease
        }))
    }
}

impl std::fmt::Debug for PostgresLeaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresLeaseStore").finish_non_exhaustive()
    }
}

// Lease rows are seeded by migration; a missing row is a configuration
// error surfaced by the caller, never auto-created here.
pub fn missing_lease_error(lease_type: &str) -> ServiceError {
    ServiceError::Configuration(format!(
        "expected a leader lease entry for worker type {lease_type}, found none"
    ))
}
