//! Daily recurring jobs on top of plain tokio tasks.
//!
//! Jobs are keyed by deterministic names (`reminder_{user}_{time}`,
//! `auto_baseline_{user}`) so they can be found and cancelled long after
//! creation without holding onto handles. A job failure is logged and the
//! job keeps its daily cadence; cancellation only ever happens through
//! [`JobQueue::cancel_job`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::error::ServiceError;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), ServiceError>> + Send>>;

/// A factory producing one run of the job, invoked once per day.
pub type JobCallback = Arc<dyn Fn() -> JobFuture + Send + Sync>;

struct JobHandle {
    time: NaiveTime,
    abort: tokio::task::AbortHandle,
}

pub struct JobQueue {
    jobs: Mutex<HashMap<String, JobHandle>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self { jobs: Mutex::new(HashMap::new()) }
    }

    /// Register a job firing daily at `time` (UTC). An existing job under
    /// the same id is replaced.
    pub fn schedule_daily(&self, job_id: &str, time: NaiveTime, callback: JobCallback) {
        let task = tokio::spawn(run_daily(job_id.to_owned(), time, callback));
        let handle = JobHandle { time, abort: task.abort_handle() };
        if let Some(previous) = self.lock().insert(job_id.to_owned(), handle) {
            previous.abort.abort();
            tracing::info!(job_id, "replaced existing scheduled job");
        } else {
            tracing::info!(job_id, %time, "scheduled daily job");
        }
    }

    /// The firing time of a registered job, or `None`.
    pub fn find_job(&self, job_id: &str) -> Option<NaiveTime> {
        self.lock().get(job_id).map(|j| j.time)
    }

    /// Cancel a job. Returns `false` (a no-op) when it does not exist.
    pub fn cancel_job(&self, job_id: &str) -> bool {
        match self.lock().remove(job_id) {
            Some(handle) => {
                handle.abort.abort();
                tracing::info!(job_id, "cancelled scheduled job");
                true
            },
            None => false,
        }
    }

    pub fn job_count(&self) -> usize {
        self.lock().len()
    }

    /// All registered job ids, sorted for stable assertions and logs.
    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobHandle>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_daily(job_id: String, time: NaiveTime, callback: JobCallback) {
    loop {
        let delay = until_next_occurrence(time, Utc::now());
        tokio::time::sleep(delay).await;
        tracing::info!(job_id = %job_id, "running scheduled job");
        if let Err(error) = callback().await {
            tracing::error!(job_id = %job_id, %error, "scheduled job failed");
        }
    }
}

/// Time until the next UTC occurrence of `time`, strictly in the future.
fn until_next_occurrence(time: NaiveTime, now: DateTime<Utc>) -> std::time::Duration {
    let today = now.date_naive().and_time(time).and_utc();
    let target = if today > now { today } else { today + Duration::days(1) };
    (target - now).to_std().unwrap_or_default()
}
