//! YAML configuration loading and validation.
//!
//! The configuration file declares the metric set, default notifications,
//! the auto-baseline default, and which storage backend to use. Everything
//! is validated here, at startup, so the rest of the system only ever sees
//! well-formed [`Metric`]s.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::metric::{Metric, MetricType, MetricValue};
use crate::notification::{AutoBaselineConfig, Notification};

/// Configuration-load failures. All of these abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("metric {metric}: unknown type {given:?} (expected \"enum\" or \"numeric\")")]
    UnknownMetricType { metric: String, given: String },

    #[error("metric {metric}: value set is empty")]
    NoValues { metric: String },

    #[error("metric {metric}: values must map labels to integer scores")]
    NonIntegerScore { metric: String },

    #[error("metric {metric}: numeric metrics need integer lower_bound and upper_bound")]
    MissingBounds { metric: String },

    #[error("metric {metric}: numeric range {lower}..={upper} is empty")]
    EmptyRange { metric: String, lower: i64, upper: i64 },

    #[error("metric {metric}: emoji labels are not supported on numeric metrics")]
    EmojiOnNumeric { metric: String },

    #[error("metric {metric}: unknown emoji shortcode {shortcode:?}")]
    UnknownEmoji { metric: String, shortcode: String },

    #[error("metric {metric}: baseline {baseline} is not one of its scores")]
    BaselineNotAScore { metric: String, baseline: i64 },

    #[error("auto-baseline is enabled but metric {metric} has no baseline")]
    AutoBaselineWithoutBaseline { metric: String },
}

/// Which document store backs the repositories. Selected once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
    Postgres {
        url: String,
    },
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("moodtrack.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::Sqlite { path: default_sqlite_path() }
    }
}

/// A metric as written in the configuration file, before expansion.
///
/// `values` stays a raw YAML mapping here because numeric metrics abuse it
/// for `lower_bound`/`upper_bound` while enum metrics use it as an ordered
/// label → score map.
#[derive(Debug, Clone, Deserialize)]
struct ConfigMetric {
    name: String,
    user_prompt: String,
    values: serde_yaml::Mapping,
    #[serde(default)]
    baseline: Option<i64>,
    #[serde(rename = "type", default = "default_metric_type")]
    kind: String,
    #[serde(default)]
    emoji: bool,
}

fn default_metric_type() -> String {
    "enum".to_owned()
}

impl ConfigMetric {
    /// Validate and expand into a domain [`Metric`].
    fn into_metric(self) -> Result<Metric, ConfigError> {
        let (metric_type, values) = match self.kind.as_str() {
            "enum" => (MetricType::Enum, self.enum_values()?),
            "numeric" => (MetricType::Numeric, self.numeric_values()?),
            other => {
                return Err(ConfigError::UnknownMetricType {
                    metric: self.name,
                    given: other.to_owned(),
                });
            },
        };

        if values.is_empty() {
            return Err(ConfigError::NoValues { metric: self.name });
        }
        if let Some(baseline) = self.baseline {
            if !values.iter().any(|v| v.score == baseline) {
                return Err(ConfigError::BaselineNotAScore { metric: self.name, baseline });
            }
        }

        Ok(Metric {
            name: self.name,
            user_prompt: self.user_prompt,
            metric_type,
            values,
            baseline: self.baseline,
        })
    }

    /// Labels in declaration order, optionally rendered from `:shortcode:`
    /// form into emoji glyphs.
    fn enum_values(&self) -> Result<Vec<MetricValue>, ConfigError> {
        let mut values = Vec::with_capacity(self.values.len());
        for (key, value) in &self.values {
            let label = key
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| ConfigError::NonIntegerScore { metric: self.name.clone() })?;
            let score = value
                .as_i64()
                .ok_or_else(|| ConfigError::NonIntegerScore { metric: self.name.clone() })?;
            let label = if self.emoji { self.emojize(&label)? } else { label };
            values.push(MetricValue { label, score });
        }
        Ok(values)
    }

    /// Expand `lower_bound..=upper_bound` into the full label set.
    fn numeric_values(&self) -> Result<Vec<MetricValue>, ConfigError> {
        if self.emoji {
            return Err(ConfigError::EmojiOnNumeric { metric: self.name.clone() });
        }
        let bound = |key: &str| self.values.get(key).and_then(serde_yaml::Value::as_i64);
        let (lower, upper) = match (bound("lower_bound"), bound("upper_bound")) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => return Err(ConfigError::MissingBounds { metric: self.name.clone() }),
        };
        if lower > upper {
            return Err(ConfigError::EmptyRange { metric: self.name.clone(), lower, upper });
        }
        Ok((lower..=upper)
            .map(|score| MetricValue { label: score.to_string(), score })
            .collect())
    }

    fn emojize(&self, label: &str) -> Result<String, ConfigError> {
        let shortcode = label.trim_matches(':');
        emojis::get_by_shortcode(shortcode)
            .map(|e| e.as_str().to_owned())
            .ok_or_else(|| ConfigError::UnknownEmoji {
                metric: self.name.clone(),
                shortcode: shortcode.to_owned(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    metrics: Vec<ConfigMetric>,
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    auto_baseline: AutoBaselineConfig,
    #[serde(default)]
    database: DatabaseConfig,
}

/// The validated startup configuration: expanded metrics, default
/// notifications, auto-baseline default, and backend selection.
#[derive(Debug, Clone)]
pub struct Configuration {
    metrics: Vec<Metric>,
    notifications: Vec<Notification>,
    auto_baseline: AutoBaselineConfig,
    database: DatabaseConfig,
}

impl Configuration {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfiguration = serde_yaml::from_str(yaml)?;

        let metrics = raw
            .metrics
            .into_iter()
            .map(ConfigMetric::into_metric)
            .collect::<Result<Vec<_>, _>>()?;

        if raw.auto_baseline.enabled() {
            if let Some(metric) = metrics.iter().find(|m| m.baseline.is_none()) {
                return Err(ConfigError::AutoBaselineWithoutBaseline {
                    metric: metric.name.clone(),
                });
            }
        }

        Ok(Self {
            metrics,
            notifications: raw.notifications,
            auto_baseline: raw.auto_baseline,
            database: raw.database,
        })
    }

    /// Load from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_yaml(&yaml)
    }

    /// The expanded metric set, in declaration order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn auto_baseline(&self) -> AutoBaselineConfig {
        self.auto_baseline
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
metrics:
  - name: mood
    user_prompt: "How do you feel right now?"
    type: enum
    emoji: true
    values:
      ":grinning:": 2
      ":neutral_face:": 0
      ":pensive:": -2
    baseline: 0
  - name: sleep
    user_prompt: "How much sleep did you get?"
    type: numeric
    values:
      lower_bound: 4
      upper_bound: 12
    baseline: 8
notifications:
  - time: "08:00:00"
    text: "Good morning! How are you?"
auto_baseline:
  enabled: true
  time: "22:00:00"
database:
  backend: sqlite
  path: test.db
"#;

    #[test]
    fn complete_config_parses() {
        let config = Configuration::from_yaml(COMPLETE).unwrap();
        assert_eq!(config.metrics().len(), 2);
        assert_eq!(config.notifications().len(), 1);
        assert!(config.auto_baseline().enabled());
    }

    #[test]
    fn numeric_metric_expands_to_inclusive_range() {
        let config = Configuration::from_yaml(COMPLETE).unwrap();
        let sleep = &config.metrics()[1];
        assert_eq!(sleep.values.len(), 9); // 4..=12
        assert_eq!(sleep.values[0].label, "4");
        assert_eq!(sleep.values[8].score, 12);
    }

    #[test]
    fn emoji_shortcodes_render_to_glyphs() {
        let config = Configuration::from_yaml(COMPLETE).unwrap();
        let mood = &config.metrics()[0];
        assert_eq!(mood.values[0].label, "😀");
        assert_eq!(mood.values[0].score, 2);
    }

    #[test]
    fn enum_value_order_is_declaration_order() {
        let config = Configuration::from_yaml(COMPLETE).unwrap();
        let scores: Vec<i64> = config.metrics()[0].values.iter().map(|v| v.score).collect();
        assert_eq!(scores, [2, 0, -2]);
    }

    #[test]
    fn rejects_unknown_metric_type() {
        let yaml = COMPLETE.replace("type: enum", "type: invalid");
        assert!(matches!(
            Configuration::from_yaml(&yaml),
            Err(ConfigError::UnknownMetricType { .. })
        ));
    }

    #[test]
    fn rejects_emoji_on_numeric_metric() {
        let yaml = COMPLETE.replace("type: numeric", "type: numeric\n    emoji: true");
        assert!(matches!(
            Configuration::from_yaml(&yaml),
            Err(ConfigError::EmojiOnNumeric { .. })
        ));
    }

    #[test]
    fn rejects_numeric_metric_without_bounds() {
        let yaml = COMPLETE.replace("      lower_bound: 4\n", "");
        assert!(matches!(
            Configuration::from_yaml(&yaml),
            Err(ConfigError::MissingBounds { .. })
        ));
    }

    #[test]
    fn rejects_baseline_outside_score_set() {
        let yaml = COMPLETE.replace("    baseline: 0", "    baseline: 7");
        assert!(matches!(
            Configuration::from_yaml(&yaml),
            Err(ConfigError::BaselineNotAScore { baseline: 7, .. })
        ));
    }

    #[test]
    fn rejects_auto_baseline_when_a_metric_lacks_one() {
        let yaml = COMPLETE.replace("    baseline: 8\n", "");
        assert!(matches!(
            Configuration::from_yaml(&yaml),
            Err(ConfigError::AutoBaselineWithoutBaseline { .. })
        ));
    }

    #[test]
    fn rejects_enabled_auto_baseline_without_time() {
        let yaml = COMPLETE.replace("  time: \"22:00:00\"\n", "");
        assert!(Configuration::from_yaml(&yaml).is_err());
    }

    #[test]
    fn database_defaults_to_sqlite() {
        let yaml = r#"
metrics:
  - name: mood
    user_prompt: "?"
    values:
      Good: 1
"#;
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(matches!(config.database(), DatabaseConfig::Sqlite { .. }));
    }
}
