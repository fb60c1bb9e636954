//! Storage access for backing clusters. Cluster provisioning is owned by a
//! separate control loop; this core only needs lookups by id.

use crate::error::{Result, ServiceError};
use crate::models::{Cluster, ClusterStatus, StreamVersion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// Storage contract for clusters.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn find_cluster_by_id(&self, cluster_id: &str) -> Result<Option<Cluster>>;
}

#[derive(Debug, FromRow)]
struct ClusterRow {
    id: String,
    cluster_id: String,
    cloud_provider: String,
    region: String,
    multi_az: bool,
    status: String,
    available_stream_versions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClusterRow> for Cluster {
    type Error = ServiceError;

    fn try_from(row: ClusterRow) -> Result<Self> {
        let status = ClusterStatus::parse(&row.status).ok_or_else(|| {
            ServiceError::Database(format!(
                "cluster {} has unknown status {}",
                row.cluster_id, row.status
            ))
        })?;
        let available_stream_versions: Vec<StreamVersion> =
            serde_json::from_value(row.available_stream_versions).map_err(|e| {
                ServiceError::Database(format!(
                    "cluster {} has malformed version list: {e}",
                    row.cluster_id
                ))
            })?;
        Ok(Cluster {
            id: row.id,
            cluster_id: row.cluster_id,
            cloud_provider: row.cloud_provider,
            region: row.region,
            multi_az: row.multi_az,
            status,
            available_stream_versions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed cluster store.
pub struct PostgresClusterStore {
    pool: PgPool,
}

impl PostgresClusterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClusterStore for PostgresClusterStore {
    async fn find_cluster_by_id(&self, cluster_id: &str) -> Result<Option<Cluster>> {
        let row = sqlx::query_as::<_, ClusterRow>(
            "SELECT * FROM clusters WHERE cluster_id = $1",
        )
        .bind(cluster_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Cluster::try_from).transpose()
    }
}

impl std::fmt::Debug for PostgresClusterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresClusterStore").finish_non_exhaustive()
    }
}
