//! PostgreSQL document-store implementation.
//!
//! Same document shape as the SQLite backend, with JSONB columns and
//! native TIMESTAMPTZ timestamps.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moodtrack_core::{Record, User};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::StorageError;
use crate::traits::{RecordStore, UserStore};

const POOL_MAX_CONNECTIONS: u32 = 5;
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(POOL_MAX_CONNECTIONS)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                 user_id  BIGINT PRIMARY KEY,
                 document JSONB NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                 id        BIGSERIAL PRIMARY KEY,
                 user_id   BIGINT NOT NULL,
                 data      JSONB NOT NULL,
                 timestamp TIMESTAMPTZ NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_user_time
                 ON records (user_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_record(row: &PgRow) -> Result<Record, StorageError> {
        let user_id: i64 = row.try_get("user_id")?;
        let data: serde_json::Value = row.try_get("data")?;
        let data: BTreeMap<String, i64> = serde_json::from_value(data)
            .map_err(StorageError::corrupt(format!("record data for user {user_id}")))?;
        let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
        Ok(Record { user_id, data, timestamp })
    }

    fn user_document(user: &User) -> Result<serde_json::Value, StorageError> {
        serde_json::to_value(user)
            .map_err(StorageError::corrupt(format!("user document {}", user.user_id)))
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT document FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let document: serde_json::Value = row.try_get("document")?;
                let user = serde_json::from_value(document)
                    .map_err(StorageError::corrupt(format!("user document {user_id}")))?;
                Ok(Some(user))
            },
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO users (user_id, document) VALUES ($1, $2)")
            .bind(user.user_id)
            .bind(Self::user_document(user)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET document = $2 WHERE user_id = $1")
            .bind(user.user_id)
            .bind(Self::user_document(user)?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "user", id: user.user_id });
        }
        Ok(())
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query("SELECT document FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let document: serde_json::Value = row.try_get("document")?;
                serde_json::from_value(document).map_err(StorageError::corrupt("user document"))
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for PgStorage {
    async fn create_record(
        &self,
        user_id: i64,
        data: &BTreeMap<String, i64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_value(data)
            .map_err(StorageError::corrupt(format!("record data for user {user_id}")))?;
        sqlx::query("INSERT INTO records (user_id, data, timestamp) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(data)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_latest_record_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Record>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, data, timestamp FROM records
             WHERE user_id = $1 ORDER BY timestamp DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_records_for_user(&self, user_id: i64) -> Result<Vec<Record>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_id, data, timestamp FROM records
             WHERE user_id = $1 ORDER BY timestamp",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn find_records_for_time_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Record>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_id, data, timestamp FROM records
             WHERE user_id = $1 AND timestamp >= $2 AND timestamp <= $3
             ORDER BY timestamp",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_record).collect()
    }
}
