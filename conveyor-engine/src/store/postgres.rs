//! PostgreSQL store
//!
//! All buckets share one table keyed by `(bucket, id)`.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use super::{Bucket, Store, StoreError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `database_url` and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conveyor_entities (
                bucket VARCHAR(32) NOT NULL,
                id VARCHAR(255) NOT NULL,
                value BYTEA NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (bucket, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn put(&self, bucket: Bucket, id: &str, value: Vec<u8>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conveyor_entities (bucket, id, value, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (bucket, id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(bucket.as_str())
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, bucket: Bucket, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM conveyor_entities WHERE bucket = $1 AND id = $2",
        )
        .bind(bucket.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn list(&self, bucket: Bucket) -> Result<Vec<Vec<u8>>, StoreError> {
        let values = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM conveyor_entities WHERE bucket = $1",
        )
        .bind(bucket.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn delete(&self, bucket: Bucket, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM conveyor_entities WHERE bucket = $1 AND id = $2")
            .bind(bucket.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
