//! Bridges users to the job queue: daily reminders and auto-baseline
//! record creation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use moodtrack_core::{DomainError, Notification, User, DEFAULT_REMINDER_TEXT};
use moodtrack_storage::traits::RecordStore;
use moodtrack_storage::StorageBackend;

use crate::error::ServiceError;
use crate::scheduler::{JobCallback, JobFuture, JobQueue};
use crate::transport::Transport;

const AUTO_BASELINE_CREATED_TEXT: &str = "A baseline record has been created for you.";

/// Deterministic job name for a user's reminder at a given time. Derivable
/// again later, so jobs can be found without holding handles.
pub fn reminder_job_id(user_id: i64, time: NaiveTime) -> String {
    format!("reminder_{user_id}_{}", time.format("%H:%M:%S"))
}

/// Deterministic job name for a user's auto-baseline job (at most one).
pub fn auto_baseline_job_id(user_id: i64) -> String {
    format!("auto_baseline_{user_id}")
}

pub struct Notifier {
    job_queue: Arc<JobQueue>,
    transport: Arc<dyn Transport>,
    storage: Arc<StorageBackend>,
}

impl Notifier {
    pub fn new(
        job_queue: Arc<JobQueue>,
        transport: Arc<dyn Transport>,
        storage: Arc<StorageBackend>,
    ) -> Self {
        Self { job_queue, transport, storage }
    }

    /// Register a daily reminder; empty notification text falls back to
    /// the default reminder string. Returns the job id.
    pub fn create_notification(&self, user_id: i64, notification: &Notification) -> String {
        let text = if notification.text.is_empty() {
            DEFAULT_REMINDER_TEXT.to_owned()
        } else {
            notification.text.clone()
        };
        let job_id = reminder_job_id(user_id, notification.time);

        let transport = Arc::clone(&self.transport);
        let callback: JobCallback = Arc::new(move || -> JobFuture {
            let transport = Arc::clone(&transport);
            let text = text.clone();
            Box::pin(async move {
                transport.send_text(user_id, &text).await?;
                Ok(())
            })
        });
        self.job_queue.schedule_daily(&job_id, notification.time, callback);
        tracing::info!(user_id, time = %notification.time, "reminder scheduled");
        job_id
    }

    /// Register the daily auto-baseline job for a user. Returns the job
    /// id; fails when the user has no auto-baseline time configured.
    pub fn create_auto_baseline(&self, user: &User) -> Result<String, ServiceError> {
        let time = user
            .auto_baseline_time()
            .ok_or(DomainError::AutoBaselineTimeNotSet)?;
        let job_id = auto_baseline_job_id(user.user_id);
        let user_id = user.user_id;

        let storage = Arc::clone(&self.storage);
        let transport = Arc::clone(&self.transport);
        let user = user.clone();
        let callback: JobCallback = Arc::new(move || -> JobFuture {
            let storage = Arc::clone(&storage);
            let transport = Arc::clone(&transport);
            let user = user.clone();
            Box::pin(async move {
                auto_baseline_tick(&storage, transport.as_ref(), &user).await.map(|_| ())
            })
        });
        self.job_queue.schedule_daily(&job_id, time, callback);
        tracing::info!(user_id, %time, "auto-baseline scheduled");
        Ok(job_id)
    }

    /// Cancel a user's auto-baseline job; a no-op if none is registered.
    pub fn remove_auto_baseline(&self, user: &User) {
        if !self.job_queue.cancel_job(&auto_baseline_job_id(user.user_id)) {
            tracing::debug!(user_id = user.user_id, "no auto-baseline job to remove");
        }
    }

    /// One auto-baseline tick, exactly what the scheduled job runs.
    /// Returns whether a record was created.
    pub async fn run_auto_baseline(&self, user: &User) -> Result<bool, ServiceError> {
        auto_baseline_tick(&self.storage, self.transport.as_ref(), user).await
    }
}

/// Create a baseline record unless one already exists for the current UTC
/// calendar day. The guard is by calendar day, not a rolling 24h window.
async fn auto_baseline_tick(
    storage: &StorageBackend,
    transport: &dyn Transport,
    user: &User,
) -> Result<bool, ServiceError> {
    let today = Utc::now().date_naive();
    if let Some(latest) = storage.get_latest_record_for_user(user.user_id).await? {
        if latest.timestamp.date_naive() == today {
            tracing::info!(
                user_id = user.user_id,
                "record already exists today, skipping auto-baseline"
            );
            return Ok(false);
        }
    }

    let missing = user.metrics_missing_baseline();
    if user.metrics.is_empty() || !missing.is_empty() {
        return Err(DomainError::BaselinesNotDefined { missing }.into());
    }
    let data: BTreeMap<String, i64> = user
        .metrics
        .iter()
        .filter_map(|m| m.baseline.map(|b| (m.name.clone(), b)))
        .collect();

    storage.create_record(user.user_id, &data, Utc::now()).await?;
    transport.send_text(user.user_id, AUTO_BASELINE_CREATED_TEXT).await?;
    tracing::info!(user_id = user.user_id, "auto-baseline record created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use moodtrack_storage::traits::RecordStore;

    use super::*;
    use crate::test_support::{test_backend, test_user, MockTransport};

    fn notifier(storage: &Arc<StorageBackend>, transport: &Arc<MockTransport>) -> Notifier {
        Notifier::new(
            Arc::new(JobQueue::new()),
            Arc::clone(transport) as Arc<dyn Transport>,
            Arc::clone(storage),
        )
    }

    #[tokio::test]
    async fn auto_baseline_creates_a_record_from_baseline_values() {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new());
        let user = test_user(1);

        let created = notifier(&storage, &transport).run_auto_baseline(&user).await.unwrap();

        assert!(created);
        let latest = storage.get_latest_record_for_user(1).await.unwrap().unwrap();
        assert_eq!(latest.value("mood"), Some(0));
        assert_eq!(latest.value("sleep"), Some(8));
        assert_eq!(transport.texts(), [AUTO_BASELINE_CREATED_TEXT]);
    }

    #[tokio::test]
    async fn second_tick_on_the_same_day_is_a_noop() {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new());
        let notifier = notifier(&storage, &transport);
        let user = test_user(1);

        assert!(notifier.run_auto_baseline(&user).await.unwrap());
        assert!(!notifier.run_auto_baseline(&user).await.unwrap());

        let records = storage.find_records_for_user(1).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn a_record_from_yesterday_does_not_block_todays_baseline() {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new());
        let user = test_user(1);

        let yesterday = Utc::now() - Duration::days(1);
        storage
            .create_record(1, &std::collections::BTreeMap::new(), yesterday)
            .await
            .unwrap();

        assert!(notifier(&storage, &transport).run_auto_baseline(&user).await.unwrap());
        assert_eq!(storage.find_records_for_user(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_baselines_surface_as_a_precondition_error() {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new());
        let mut user = test_user(1);
        user.metrics[1].baseline = None;

        let err = notifier(&storage, &transport).run_auto_baseline(&user).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::BaselinesNotDefined { ref missing })
                if missing == &["sleep".to_owned()]
        ));
        assert!(storage.find_records_for_user(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reminder_job_uses_default_text_when_empty() {
        let storage = test_backend();
        let transport = Arc::new(MockTransport::new());
        let notifier = notifier(&storage, &transport);

        let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let job_id = notifier
            .create_notification(1, &Notification { time, text: String::new() });

        assert_eq!(job_id, "reminder_1_08:00:00");
        assert_eq!(notifier.job_queue.find_job(&job_id), Some(time));
    }
}
