//! SQLite document-store implementation.
//!
//! Users and record data are stored as JSON documents in TEXT columns,
//! mirroring the document-database shape the service layer expects.
//! Timestamps are fixed-width RFC 3339 UTC strings, so lexicographic
//! comparison in SQL is chronological comparison.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use moodtrack_core::{Record, User};
use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::traits::{RecordStore, UserStore};

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

fn lock_conn(mutex: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StorageError> {
    mutex.lock().map_err(|_| StorageError::LockPoisoned)
}

fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| StorageError::InvalidTimestamp { raw: raw.to_owned(), source })
}

impl SqliteStorage {
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// In-memory database, for tests and throwaway runs.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn init_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r"CREATE TABLE IF NOT EXISTS users (
                  user_id  INTEGER PRIMARY KEY,
                  document TEXT NOT NULL
              );
              CREATE TABLE IF NOT EXISTS records (
                  id        INTEGER PRIMARY KEY AUTOINCREMENT,
                  user_id   INTEGER NOT NULL,
                  data      TEXT NOT NULL,
                  timestamp TEXT NOT NULL
              );
              CREATE INDEX IF NOT EXISTS idx_records_user_time
                  ON records (user_id, timestamp);",
        )?;
        Ok(())
    }

    fn row_to_record(
        user_id: i64,
        data: &str,
        timestamp: &str,
    ) -> Result<Record, StorageError> {
        let data: BTreeMap<String, i64> = serde_json::from_str(data)
            .map_err(StorageError::corrupt(format!("record data for user {user_id}")))?;
        Ok(Record { user_id, data, timestamp: decode_timestamp(timestamp)? })
    }
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare("SELECT document FROM users WHERE user_id = ?1")?;
        let mut rows = stmt.query(params![user_id])?;
        match rows.next()? {
            Some(row) => {
                let document: String = row.get(0)?;
                let user = serde_json::from_str(&document)
                    .map_err(StorageError::corrupt(format!("user document {user_id}")))?;
                Ok(Some(user))
            },
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let document = serde_json::to_string(user)
            .map_err(StorageError::corrupt(format!("user document {}", user.user_id)))?;
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO users (user_id, document) VALUES (?1, ?2)",
            params![user.user_id, document],
        )?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let document = serde_json::to_string(user)
            .map_err(StorageError::corrupt(format!("user document {}", user.user_id)))?;
        let conn = lock_conn(&self.conn)?;
        let updated = conn.execute(
            "UPDATE users SET document = ?2 WHERE user_id = ?1",
            params![user.user_id, document],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound { entity: "user", id: user.user_id });
        }
        Ok(())
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare("SELECT document FROM users ORDER BY user_id")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let document: String = row.get(0)?;
            users.push(
                serde_json::from_str(&document)
                    .map_err(StorageError::corrupt("user document"))?,
            );
        }
        Ok(users)
    }
}

#[async_trait]
impl RecordStore for SqliteStorage {
    async fn create_record(
        &self,
        user_id: i64,
        data: &BTreeMap<String, i64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_string(data)
            .map_err(StorageError::corrupt(format!("record data for user {user_id}")))?;
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO records (user_id, data, timestamp) VALUES (?1, ?2, ?3)",
            params![user_id, data, encode_timestamp(timestamp)],
        )?;
        Ok(())
    }

    async fn get_latest_record_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Record>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT data, timestamp FROM records
             WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT 1",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        match rows.next()? {
            Some(row) => {
                let data: String = row.get(0)?;
                let timestamp: String = row.get(1)?;
                Ok(Some(Self::row_to_record(user_id, &data, &timestamp)?))
            },
            None => Ok(None),
        }
    }

    async fn find_records_for_user(&self, user_id: i64) -> Result<Vec<Record>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT data, timestamp FROM records
             WHERE user_id = ?1 ORDER BY timestamp",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let data: String = row.get(0)?;
            let timestamp: String = row.get(1)?;
            records.push(Self::row_to_record(user_id, &data, &timestamp)?);
        }
        Ok(records)
    }

    async fn find_records_for_time_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Record>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT data, timestamp FROM records
             WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp",
        )?;
        let mut rows =
            stmt.query(params![user_id, encode_timestamp(start), encode_timestamp(end)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let data: String = row.get(0)?;
            let timestamp: String = row.get(1)?;
            records.push(Self::row_to_record(user_id, &data, &timestamp)?);
        }
        Ok(records)
    }
}
