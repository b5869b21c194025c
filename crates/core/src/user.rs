use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::notification::{AutoBaselineConfig, Notification};

/// Aggregate holding one user's metric, notification, and auto-baseline
/// configuration. `user_id` is the external Telegram identity and the
/// primary key everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub auto_baseline_config: AutoBaselineConfig,
}

impl User {
    /// Whether every metric carries a baseline value.
    pub fn has_baselines_defined(&self) -> bool {
        !self.metrics.is_empty() && self.metrics.iter().all(|m| m.baseline.is_some())
    }

    /// Names of metrics still lacking a baseline, in configuration order.
    pub fn metrics_missing_baseline(&self) -> Vec<String> {
        self.metrics
            .iter()
            .filter(|m| m.baseline.is_none())
            .map(|m| m.name.clone())
            .collect()
    }

    pub fn has_auto_baseline_enabled(&self) -> bool {
        self.auto_baseline_config.enabled()
    }

    pub fn auto_baseline_time(&self) -> Option<NaiveTime> {
        self.auto_baseline_config.time()
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
