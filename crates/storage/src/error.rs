//! Typed error enum for the storage layer.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for an entity the caller expected to exist.
    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// SQLite call failed.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL / connection / timeout failure.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be deserialized into its domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored timestamp string is not valid RFC 3339.
    #[error("invalid stored timestamp {raw:?}")]
    InvalidTimestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The connection mutex was poisoned by a panicking holder.
    #[error("database lock poisoned")]
    LockPoisoned,

    /// The configuration selected a backend this build does not include.
    #[error("backend not compiled in: {0}")]
    BackendUnavailable(&'static str),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying upstream).
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            _ => false,
        }
    }

    /// Wrap a serde failure with the document context it occurred in.
    pub fn corrupt(context: impl Into<String>) -> impl FnOnce(serde_json::Error) -> Self {
        let context = context.into();
        move |source| Self::DataCorruption { context, source }
    }
}
