//! Shared fixtures for service-layer tests: an in-memory storage backend,
//! a capturing transport, and a canonical two-metric user.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use moodtrack_core::config::Configuration;
use moodtrack_core::{AutoBaselineConfig, Metric, MetricType, MetricValue, User};
use moodtrack_storage::{SqliteStorage, StorageBackend};

use crate::transport::{InlineButton, Transport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Text { user_id: i64, text: String },
    Keyboard { user_id: i64, text: String, keyboard: Vec<Vec<InlineButton>> },
    Photo { user_id: i64, path: std::path::PathBuf },
}

/// Transport double that records every send.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Just the plain-text sends, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// The most recent keyboard send, as `(prompt, payloads)`.
    pub fn last_keyboard(&self) -> Option<(String, Vec<String>)> {
        self.sent().into_iter().rev().find_map(|m| match m {
            SentMessage::Keyboard { text, keyboard, .. } => Some((
                text,
                keyboard.into_iter().flatten().map(|b| b.payload).collect(),
            )),
            _ => None,
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(SentMessage::Text { user_id, text: text.to_owned() });
        Ok(())
    }

    async fn send_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: &[Vec<InlineButton>],
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentMessage::Keyboard {
            user_id,
            text: text.to_owned(),
            keyboard: keyboard.to_vec(),
        });
        Ok(())
    }

    async fn send_photo(&self, user_id: i64, photo: &Path) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(SentMessage::Photo { user_id, path: photo.to_path_buf() });
        Ok(())
    }
}

pub fn test_backend() -> Arc<StorageBackend> {
    Arc::new(StorageBackend::Sqlite(SqliteStorage::in_memory().unwrap()))
}

/// mood (enum, baseline 0) + sleep (numeric 4..=12, baseline 8).
pub fn test_user(user_id: i64) -> User {
    User {
        user_id,
        metrics: vec![
            Metric {
                name: "mood".to_owned(),
                user_prompt: "How do you feel right now?".to_owned(),
                metric_type: MetricType::Enum,
                values: vec![
                    MetricValue { label: "Great".to_owned(), score: 3 },
                    MetricValue { label: "Neutral".to_owned(), score: 0 },
                    MetricValue { label: "Awful".to_owned(), score: -3 },
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

/// The same shape as the test user, as a parsed configuration, with one
/// notification and a preconfigured (but disabled) auto-baseline time.
pub fn test_config() -> Configuration {
    Configuration::from_yaml(
        r#"
metrics:
  - name: mood
    user_prompt: "How do you feel right now?"
    values:
      Great: 3
      Neutral: 0
      Awful: -3
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
  enabled: false
  time: "22:00:00"
"#,
    )
    .unwrap()
}
