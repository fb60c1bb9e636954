//! Connection management for the shared Postgres pool.

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::env;

/// Owns the SQLx connection pool used by every Postgres-backed store.
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Connect using `DATABASE_URL` when present, otherwise the configured
    /// connection parameters.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| config.url());

        let pool = PgPoolOptions::new()
            .max_connections(config.pool)
            .acquire_timeout(config.checkout_timeout())
            .connect(&database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await?;
        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
