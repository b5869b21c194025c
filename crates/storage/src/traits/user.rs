use async_trait::async_trait;
use moodtrack_core::User;

use crate::error::StorageError;

/// User configuration persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by their external id.
    async fn find_user(&self, user_id: i64) -> Result<Option<User>, StorageError>;

    /// Persist a freshly seeded user. The caller builds the user from
    /// configuration defaults; this only stores it.
    async fn create_user(&self, user: &User) -> Result<(), StorageError>;

    /// Full replace of the user's metrics, notifications, and
    /// auto-baseline configuration.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;

    /// All registered users, used for startup job scheduling.
    async fn find_all_users(&self) -> Result<Vec<User>, StorageError>;
}
