//! # Request Store
//!
//! Storage contract for stream requests, plus the Postgres implementation.
//! All operations are safe to call repeatedly with the same logical effect:
//! listings are reads, updates overwrite the same columns, and deletion of an
//! already-deleted request is a no-op.

use crate::error::{Result, ServiceError};
use crate::models::{RequestStatus, StreamRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// Storage contract for stream requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// List non-deleted requests in any of the given statuses, in stable
    /// creation order.
    async fn list_by_statuses(&self, statuses: &[RequestStatus]) -> Result<Vec<StreamRequest>>;

    /// List every non-deleted request.
    async fn list_all(&self) -> Result<Vec<StreamRequest>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<StreamRequest>>;

    /// Persist the request's current column values.
    async fn update(&self, request: &StreamRequest) -> Result<()>;

    /// Update only the status column. Returns whether a row actually
    /// changed (false when the request is gone or already in that status).
    async fn update_status(&self, id: &str, status: RequestStatus) -> Result<bool>;

    /// Soft-delete the request. Deleting an already-deleted request is a
    /// no-op, not a failure.
    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct StreamRequestRow {
    id: String,
    name: String,
    owner: String,
    status: String,
    cloud_provider: String,
    region: String,
    multi_az: bool,
    instance_type: String,
    cluster_id: Option<String>,
    subscription_id: Option<String>,
    failed_reason: Option<String>,
    desired_stream_version: Option<String>,
    desired_operator_version: Option<String>,
    bootstrap_url: Option<String>,
    routes_created: bool,
    tls_certificate_ref: Option<String>,
    service_account_client_id: Option<String>,
    service_account_secret: Option<String>,
    canary_service_account_client_id: Option<String>,
    canary_service_account_secret: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<StreamRequestRow> for StreamRequest {
    type Error = ServiceError;

    fn try_from(row: StreamRequestRow) -> Result<Self> {
        let status = RequestStatus::parse(&row.status).ok_or_else(|| {
            ServiceError::Database(format!(
                "stream request {} has unknown status {}",
                row.id, row.status
            ))
        })?;
        Ok(StreamRequest {
            id: row.id,
            name: row.name,
            owner: row.owner,
            status,
            cloud_provider: row.cloud_provider,
            region: row.region,
            multi_az: row.multi_az,
            instance_type: row.instance_type,
            cluster_id: row.cluster_id,
            subscription_id: row.subscription_id,
            failed_reason: row.failed_reason,
            desired_stream_version: row.desired_stream_version,
            desired_operator_version: row.desired_operator_version,
            bootstrap_url: row.bootstrap_url,
            routes_created: row.routes_created,
            tls_certificate_ref: row.tls_certificate_ref,
            service_account_client_id: row.service_account_client_id,
            service_account_secret: row.service_account_secret,
            canary_service_account_client_id: row.canary_service_account_client_id,
            canary_service_account_secret: row.canary_service_account_secret,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// Postgres-backed request store.
pub struct PostgresRequestStore {
    pool: PgPool,
}

impl PostgresRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PostgresRequestStore {
    async fn list_by_statuses(&self, statuses: &[RequestStatus]) -> Result<Vec<StreamRequest>> {
        let status_strings: Vec<String> =
            statuses.iter().map(|s| s.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, StreamRequestRow>(
            "SELECT * FROM stream_requests \
             WHERE deleted_at IS NULL AND status = ANY($1) \
             ORDER BY created_at",
        )
        .bind(&status_strings)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(StreamRequest::try_from).collect()
    }

    async fn list_all(&self) -> Result<Vec<StreamRequest>> {
        let rows = sqlx::query_as::<_, StreamRequestRow>(
            "SELECT * FROM stream_requests WHERE deleted_at IS NULL ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(StreamRequest::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StreamRequest>> {
        let row = sqlx::query_as::<_, StreamRequestRow>(
            "SELECT * FROM stream_requests WHERE deleted_at IS NULL AND id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(StreamRequest::try_from).transpose()
    }

    async fn update(&self, request: &StreamRequest) -> Result<()> {
        sqlx::query(
            "UPDATE stream_requests SET \
               status = $2, cluster_id = $3, subscription_id = $4, failed_reason = $5, \
               desired_stream_version = $6, desired_operator_version = $7, \
               bootstrap_url = $8, routes_created = $9, tls_certificate_ref = $10, \
               service_account_client_id = $11, service_account_secret = $12, \
               canary_service_account_client_id = $13, canary_service_account_secret = $14, \
               expires_at = $15, updated_at = $16 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(&request.id)
        .bind(request.status.as_str())
        .bind(&request.cluster_id)
        .bind(&request.subscription_id)
        .bind(&request.failed_reason)
        .bind(&request.desired_stream_version)
        .bind(&request.desired_operator_version)
        .bind(&request.bootstrap_url)
        .bind(request.routes_created)
        .bind(&request.tls_certificate_ref)
        .bind(&request.service_account_client_id)
        .bind(&request.service_account_secret)
        .bind(&request.canary_service_account_client_id)
        .bind(&request.canary_service_account_secret)
        .bind(request.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: RequestStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE stream_requests SET status = $2, updated_at = $3 \
             WHERE id = $1 AND deleted_at IS NULL AND status <> $2",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE stream_requests SET deleted_at = $2, updated_at = $2 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PostgresRequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRequestStore").finish_non_exhaustive()
    }
}
