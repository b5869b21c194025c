use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::metric::Metric;

/// A single data point inside an in-progress record: a metric name and the
/// answer given so far, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    pub metric_name: String,
    pub value: Option<i64>,
}

/// An in-progress record, held in memory while the user answers prompts.
///
/// Snapshots the user's metric configuration at creation time: a
/// configuration change mid-conversation does not alter which questions
/// the record accepts (answers for metrics outside the snapshot fail with
/// [`DomainError::UnknownMetric`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempRecord {
    metrics: Vec<Metric>,
    data: Vec<RecordData>,
    timestamp: DateTime<Utc>,
}

impl TempRecord {
    /// Snapshot `metrics` (order preserved) with every answer unset.
    pub fn new(metrics: &[Metric], now: DateTime<Utc>) -> Self {
        let data = metrics
            .iter()
            .map(|m| RecordData { metric_name: m.name.clone(), value: None })
            .collect();
        Self { metrics: metrics.to_vec(), data, timestamp: now }
    }

    /// The metric snapshot, in prompt order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn data(&self) -> &[RecordData] {
        &self.data
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The first metric (in snapshot order) without an answer.
    pub fn first_unanswered(&self) -> Option<&Metric> {
        self.data
            .iter()
            .position(|d| d.value.is_none())
            .and_then(|i| self.metrics.get(i))
    }

    /// Store an answer, overwriting any previous one (last write wins).
    pub fn update_value(&mut self, metric_name: &str, value: i64) -> Result<(), DomainError> {
        match self.data.iter_mut().find(|d| d.metric_name == metric_name) {
            Some(entry) => {
                entry.value = Some(value);
                Ok(())
            },
            None => Err(DomainError::UnknownMetric { name: metric_name.to_owned() }),
        }
    }

    /// Whether every metric has an answer.
    pub fn is_complete(&self) -> bool {
        self.data.iter().all(|d| d.value.is_some())
    }

    /// Move the record's timestamp `days` whole days into the past.
    pub fn offset_timestamp(&mut self, days: i64) -> DateTime<Utc> {
        self.timestamp = self.timestamp - Duration::days(days);
        self.timestamp
    }

    /// The answered values as a name → score map. Unanswered metrics are
    /// omitted; callers check [`Self::is_complete`] before finalizing.
    pub fn data_map(&self) -> BTreeMap<String, i64> {
        self.data
            .iter()
            .filter_map(|d| d.value.map(|v| (d.metric_name.clone(), v)))
            .collect()
    }
}

/// A finalized, persisted snapshot of one user's answers at a point in
/// time. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub user_id: i64,
    pub data: BTreeMap<String, i64>,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    pub fn value(&self, metric_name: &str) -> Option<i64> {
        self.data.get(metric_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{MetricType, MetricValue};

    fn metric(name: &str, scores: &[i64]) -> Metric {
        Metric {
            name: name.to_owned(),
            user_prompt: format!("How is your {name}?"),
            metric_type: MetricType::Enum,
            values: scores
                .iter()
                .map(|&s| MetricValue { label: s.to_string(), score: s })
                .collect(),
            baseline: None,
        }
    }

    fn mood_and_sleep() -> Vec<Metric> {
        vec![metric("mood", &[3, 0]), metric("sleep", &[8])]
    }

    #[test]
    fn snapshot_is_independent_of_later_config_changes() {
        let mut metrics = mood_and_sleep();
        let record = TempRecord::new(&metrics, Utc::now());

        metrics.pop();
        metrics[0].name = "energy".to_owned();

        let names: Vec<&str> = record.metrics().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["mood", "sleep"]);
        assert_eq!(record.data().len(), 2);
    }

    #[test]
    fn answers_complete_in_snapshot_order() {
        let mut record = TempRecord::new(&mood_and_sleep(), Utc::now());
        assert_eq!(record.first_unanswered().unwrap().name, "mood");
        assert!(!record.is_complete());

        record.update_value("mood", 3).unwrap();
        assert_eq!(record.first_unanswered().unwrap().name, "sleep");

        record.update_value("sleep", 8).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.first_unanswered(), None);
    }

    #[test]
    fn completion_is_monotonic_under_reanswers() {
        let mut record = TempRecord::new(&mood_and_sleep(), Utc::now());
        record.update_value("mood", 3).unwrap();
        record.update_value("sleep", 8).unwrap();
        assert!(record.is_complete());

        record.update_value("mood", 0).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.data_map().get("mood"), Some(&0));
    }

    #[test]
    fn last_write_wins_on_duplicate_answers() {
        let mut record = TempRecord::new(&mood_and_sleep(), Utc::now());
        record.update_value("mood", 3).unwrap();
        record.update_value("mood", 3).unwrap();
        assert_eq!(record.data_map().get("mood"), Some(&3));
        assert_eq!(record.first_unanswered().unwrap().name, "sleep");
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let mut record = TempRecord::new(&mood_and_sleep(), Utc::now());
        let err = record.update_value("appetite", 1).unwrap_err();
        assert_eq!(err, DomainError::UnknownMetric { name: "appetite".to_owned() });
    }

    #[test]
    fn offset_moves_timestamp_back_whole_days() {
        let start = "2024-06-10T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut record = TempRecord::new(&mood_and_sleep(), start);
        let moved = record.offset_timestamp(1);
        assert_eq!(moved, "2024-06-09T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(record.timestamp(), moved);
    }
}
