//! User lifecycle orchestration.
//!
//! The only place allowed to mutate a [`User`] and touch the notifier in
//! the same breath, so the stored flag and the scheduled job can never
//! drift apart.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use moodtrack_core::config::Configuration;
use moodtrack_core::{DomainError, User};
use moodtrack_storage::traits::{RecordStore, UserStore};
use moodtrack_storage::{StorageBackend, StorageError};

use crate::error::ServiceError;
use crate::notifier::Notifier;

/// What `/start` did for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created(User),
    AlreadyRegistered,
}

pub struct UserService {
    storage: Arc<StorageBackend>,
    notifier: Arc<Notifier>,
    config: Arc<Configuration>,
}

impl UserService {
    pub fn new(
        storage: Arc<StorageBackend>,
        notifier: Arc<Notifier>,
        config: Arc<Configuration>,
    ) -> Self {
        Self { storage, notifier, config }
    }

    pub async fn find_user(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.storage.find_user(user_id).await?)
    }

    /// Handle `/start`: seed a user from configuration defaults, persist,
    /// then set up notifications and (if configured) auto-baseline, in
    /// that order.
    pub async fn create_user(&self, user_id: i64) -> Result<RegistrationOutcome, ServiceError> {
        if self.storage.find_user(user_id).await?.is_some() {
            tracing::info!(user_id, "received /start, but user already exists");
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        let user = User {
            user_id,
            metrics: self.config.metrics().to_vec(),
            notifications: self.config.notifications().to_vec(),
            auto_baseline_config: self.config.auto_baseline(),
        };
        self.storage.create_user(&user).await?;
        tracing::info!(user_id, "created user from configuration defaults");

        self.setup_notifications(&user);
        self.setup_auto_baseline(&user)?;
        Ok(RegistrationOutcome::Created(user))
    }

    /// Flip auto-baseline for a user. Returns the new enabled state.
    ///
    /// Enabling validates both preconditions, each with its own error:
    /// every metric needs a baseline, and a time must be configured. The
    /// stored flag is only touched after validation passes, so a failed
    /// toggle leaves the user unchanged.
    pub async fn toggle_auto_baseline(&self, user_id: i64) -> Result<bool, ServiceError> {
        let Some(mut user) = self.storage.find_user(user_id).await? else {
            return Err(StorageError::NotFound { entity: "user", id: user_id }.into());
        };

        if user.has_auto_baseline_enabled() {
            user.auto_baseline_config.disable();
            self.notifier.remove_auto_baseline(&user);
            self.storage.update_user(&user).await?;
            tracing::info!(user_id, "auto-baseline disabled");
            Ok(false)
        } else {
            if !user.has_baselines_defined() {
                return Err(DomainError::BaselinesNotDefined {
                    missing: user.metrics_missing_baseline(),
                }
                .into());
            }
            user.auto_baseline_config.enable()?;
            self.notifier.create_auto_baseline(&user)?;
            self.storage.update_user(&user).await?;
            tracing::info!(user_id, "auto-baseline enabled");
            Ok(true)
        }
    }

    pub fn setup_notifications(&self, user: &User) {
        for notification in &user.notifications {
            self.notifier.create_notification(user.user_id, notification);
        }
    }

    pub fn setup_auto_baseline(&self, user: &User) -> Result<(), ServiceError> {
        if user.has_auto_baseline_enabled() {
            self.notifier.create_auto_baseline(user)?;
        }
        Ok(())
    }

    /// Startup pass: re-register every stored user's reminders and
    /// auto-baseline jobs.
    pub async fn schedule_all(&self) -> Result<(), ServiceError> {
        for user in self.storage.find_all_users().await? {
            self.setup_notifications(&user);
            if user.has_auto_baseline_enabled() && user.has_baselines_defined() {
                self.notifier.create_auto_baseline(&user)?;
            }
        }
        Ok(())
    }
}

/// Admin backfill: insert one record of `defaults` per day in `from..=to`,
/// stamped at noon UTC. Returns how many were created. Lives outside
/// [`UserService`] because it needs no notifier or transport, only storage.
pub async fn backfill_neutral_records(
    storage: &StorageBackend,
    user_id: i64,
    defaults: &BTreeMap<String, i64>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<usize, ServiceError> {
    let mut count = 0;
    let mut day = from;
    while day <= to {
        let timestamp = day.and_hms_opt(12, 0, 0).expect("noon exists").and_utc();
        tracing::info!(user_id, %day, "inserting neutral record");
        storage.create_record(user_id, defaults, timestamp).await?;
        count += 1;
        day = day.succ_opt().expect("date within calendar bounds");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use moodtrack_core::AutoBaselineConfig;

    use super::*;
    use crate::notifier::auto_baseline_job_id;
    use crate::scheduler::JobQueue;
    use crate::test_support::{test_backend, test_config, test_user, MockTransport};
    use crate::transport::Transport;

    struct Fixture {
        storage: Arc<StorageBackend>,
        job_queue: Arc<JobQueue>,
        service: UserService,
    }

    fn fixture() -> Fixture {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new()) as Arc<dyn Transport>;
        let job_queue = Arc::new(JobQueue::new());
        let notifier = Arc::new(Notifier::new(
            Arc::clone(&job_queue),
            transport,
            Arc::clone(&storage),
        ));
        let service =
            UserService::new(Arc::clone(&storage), notifier, Arc::new(test_config()));
        Fixture { storage, job_queue, service }
    }

    #[tokio::test]
    async fn create_user_seeds_defaults_and_schedules_reminders() {
        let f = fixture();
        let outcome = f.service.create_user(1).await.unwrap();

        let RegistrationOutcome::Created(user) = outcome else {
            panic!("expected a fresh registration");
        };
        assert_eq!(user.metrics.len(), 2);
        assert_eq!(f.job_queue.job_count(), 1);
        assert!(f.storage.find_user(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_user_twice_reports_already_registered() {
        let f = fixture();
        f.service.create_user(1).await.unwrap();
        assert_eq!(
            f.service.create_user(1).await.unwrap(),
            RegistrationOutcome::AlreadyRegistered
        );
    }

    #[tokio::test]
    async fn toggle_round_trip_restores_job_count() {
        let f = fixture();
        f.service.create_user(1).await.unwrap();
        let before = f.job_queue.job_count();

        assert!(f.service.toggle_auto_baseline(1).await.unwrap());
        assert!(f.job_queue.find_job(&auto_baseline_job_id(1)).is_some());
        let user = f.storage.find_user(1).await.unwrap().unwrap();
        assert!(user.has_auto_baseline_enabled());

        assert!(!f.service.toggle_auto_baseline(1).await.unwrap());
        assert_eq!(f.job_queue.job_count(), before);
        let user = f.storage.find_user(1).await.unwrap().unwrap();
        assert!(!user.has_auto_baseline_enabled());
    }

    #[tokio::test]
    async fn enabling_without_baselines_fails_and_changes_nothing() {
        let f = fixture();
        f.service.create_user(1).await.unwrap();

        let mut user = f.storage.find_user(1).await.unwrap().unwrap();
        user.metrics[1].baseline = None;
        f.storage.update_user(&user).await.unwrap();

        let err = f.service.toggle_auto_baseline(1).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::BaselinesNotDefined { ref missing })
                if missing == &["sleep".to_owned()]
        ));

        let user = f.storage.find_user(1).await.unwrap().unwrap();
        assert!(!user.has_auto_baseline_enabled());
        assert!(f.job_queue.find_job(&auto_baseline_job_id(1)).is_none());
    }

    #[tokio::test]
    async fn enabling_without_a_time_fails_with_its_own_error() {
        let f = fixture();
        f.service.create_user(1).await.unwrap();

        let mut user = f.storage.find_user(1).await.unwrap().unwrap();
        user.auto_baseline_config = AutoBaselineConfig::disabled(None);
        f.storage.update_user(&user).await.unwrap();

        let err = f.service.toggle_auto_baseline(1).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::AutoBaselineTimeNotSet)
        ));
    }

    #[tokio::test]
    async fn schedule_all_registers_jobs_for_every_stored_user() {
        let f = fixture();
        let mut user = test_user(7);
        user.notifications = test_config().notifications().to_vec();
        user.auto_baseline_config =
            AutoBaselineConfig::new(true, NaiveTime::from_hms_opt(22, 0, 0)).unwrap();
        f.storage.create_user(&user).await.unwrap();

        f.service.schedule_all().await.unwrap();
        assert_eq!(f.job_queue.job_count(), 2);
        assert!(f.job_queue.find_job(&auto_baseline_job_id(7)).is_some());
    }

    #[tokio::test]
    async fn backfill_inserts_one_record_per_day() {
        let f = fixture();
        let defaults: BTreeMap<String, i64> =
            [("mood".to_owned(), 0), ("sleep".to_owned(), 8)].into();
        let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        let count =
            backfill_neutral_records(&f.storage, 1, &defaults, from, to).await.unwrap();

        assert_eq!(count, 3);
        let records = f.storage.find_records_for_user(1).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.value("sleep") == Some(8)));
    }
}
