use serde::{Deserialize, Serialize};

/// One answer option of a metric: a button label and the integer score it
/// maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValue {
    pub label: String,
    pub score: i64,
}

/// Whether a metric's answers come from a hand-written label set or from
/// an expanded numeric range. After configuration loading both kinds carry
/// a full label set; the distinction only matters at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Enum,
    Numeric,
}

/// A trackable quantity: a prompt and a closed, ordered set of labeled
/// integer answers.
///
/// `values` is a list, not a map: its order determines button layout and
/// must survive persistence round-trips. Construction happens through
/// configuration parsing ([`crate::config`]), which validates the value
/// set and baseline before a `Metric` ever exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub user_prompt: String,
    pub metric_type: MetricType,
    pub values: Vec<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<i64>,
}

impl Metric {
    /// Look up the score for a button label.
    pub fn score_for(&self, label: &str) -> Option<i64> {
        self.values.iter().find(|v| v.label == label).map(|v| v.score)
    }

    /// Whether `score` is one of this metric's allowed scores.
    pub fn accepts_score(&self, score: i64) -> bool {
        self.values.iter().any(|v| v.score == score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood() -> Metric {
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
        }
    }

    #[test]
    fn score_lookup_respects_labels() {
        let metric = mood();
        assert_eq!(metric.score_for("Great"), Some(2));
        assert_eq!(metric.score_for("Awful"), Some(-2));
        assert_eq!(metric.score_for("great"), None);
    }

    #[test]
    fn accepts_only_configured_scores() {
        let metric = mood();
        assert!(metric.accepts_score(0));
        assert!(!metric.accepts_score(1));
    }

    #[test]
    fn value_order_survives_serde_round_trip() {
        let metric = mood();
        let json = serde_json::to_string(&metric).unwrap();
        let back: Metric = serde_json::from_str(&json).unwrap();
        let labels: Vec<&str> = back.values.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["Great", "Neutral", "Awful"]);
    }
}
