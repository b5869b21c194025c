//! Test utilities and module declarations for storage tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use moodtrack_core::{AutoBaselineConfig, Metric, MetricType, MetricValue, User};
use tempfile::TempDir;

use crate::SqliteStorage;

mod user_tests;

pub fn create_test_storage() -> (SqliteStorage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = SqliteStorage::new(&db_path).unwrap();
    (storage, temp_dir)
}

pub fn create_test_user(user_id: i64) -> User {
    User {
        user_id,
        metrics: vec![
            Metric {
                name: "mood".to_owned(),
                user_prompt: "How do you feel right now?".to_owned(),
                metric_type: MetricType::Enum,
                values: vec![
                    MetricValue { label: "Great".to_owned(), score: 2 },
                    MetricValue { label: "Neutral".to_owned(), score: 0 },
                    MetricValue { label: "Awful".to_owned(), score: -2 },
                ],
                baseline: Some(0),
            },
            Metric {
                name: "sleep".to_owned(),
                user_prompt: "How much sleep did you get?".to_owned(),
                metric_type: MetricType::Numeric,
                values: (4..=12)
                    .map(|score| MetricValue { label: score.to_string(), score })
                    .collect(),
                baseline: Some(8),
            },
        ],
        notifications: vec![],
        auto_baseline_config: AutoBaselineConfig::default(),
    }
}

pub fn data(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|&(name, value)| (name.to_owned(), value)).collect()
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}
