//! Unified storage backend with enum dispatch.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moodtrack_core::config::DatabaseConfig;
use moodtrack_core::{Record, User};

use crate::error::StorageError;
use crate::traits::{RecordStore, UserStore};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::SqliteStorage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

/// The backend selected at startup. Everything downstream holds an
/// `Arc<StorageBackend>` and stays oblivious to which variant is live.
#[derive(Clone)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteStorage),
    #[cfg(feature = "postgres")]
    Postgres(crate::PgStorage),
}

impl StorageBackend {
    /// Build the backend the configuration asks for.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, StorageError> {
        match config {
            DatabaseConfig::Sqlite { path } => {
                #[cfg(feature = "sqlite")]
                {
                    tracing::info!(path = %path.display(), "using sqlite backend");
                    Ok(Self::Sqlite(crate::SqliteStorage::new(path)?))
                }
                #[cfg(not(feature = "sqlite"))]
                {
                    let _ = path;
                    Err(StorageError::BackendUnavailable("sqlite"))
                }
            },
            DatabaseConfig::Postgres { url } => {
                #[cfg(feature = "postgres")]
                {
                    tracing::info!("using postgres backend");
                    Ok(Self::Postgres(crate::PgStorage::new(url).await?))
                }
                #[cfg(not(feature = "postgres"))]
                {
                    let _ = url;
                    Err(StorageError::BackendUnavailable("postgres"))
                }
            },
        }
    }
}

#[async_trait]
impl UserStore for StorageBackend {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        dispatch!(self, UserStore, find_user(user_id))
    }

    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        dispatch!(self, UserStore, create_user(user))
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        dispatch!(self, UserStore, update_user(user))
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StorageError> {
        dispatch!(self, UserStore, find_all_users())
    }
}

#[async_trait]
impl RecordStore for StorageBackend {
    async fn create_record(
        &self,
        user_id: i64,
        data: &BTreeMap<String, i64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, RecordStore, create_record(user_id, data, timestamp))
    }

    async fn get_latest_record_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Record>, StorageError> {
        dispatch!(self, RecordStore, get_latest_record_for_user(user_id))
    }

    async fn find_records_for_user(&self, user_id: i64) -> Result<Vec<Record>, StorageError> {
        dispatch!(self, RecordStore, find_records_for_user(user_id))
    }

    async fn find_records_for_time_range(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Record>, StorageError> {
        dispatch!(self, RecordStore, find_records_for_time_range(user_id, start, end))
    }
}
