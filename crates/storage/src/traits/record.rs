use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moodtrack_core::Record;

use crate::error::StorageError;

/// Finalized record persistence. Records are insert-only; nothing here
/// mutates an existing row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a completed record.
    async fn create_record(
        &self,
        user_id: i64,
        data: &BTreeMap<String, i64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// The most recent record by timestamp, if any.
    async fn get_latest_record_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Record>, StorageError>;

    /// All of a user's records, oldest first.
    async fn find_records_for_user(&self, user_id: i64) -> Result<Vec<Record>, StorageError>;

    /// Records with `start <= timestamp <= end`, oldest first.
    async fn find_records_for_time_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Record>, StorageError>;
}
