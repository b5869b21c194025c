//! The recording flow: walk a user through their metrics one button press
//! at a time, accumulate answers in an in-flight record, persist on
//! completion.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use moodtrack_core::{DomainError, TempRecord, User};
use moodtrack_storage::traits::{RecordStore, UserStore};
use moodtrack_storage::StorageBackend;

use crate::error::ServiceError;
use crate::sessions::{ConversationState, SessionManager};
use crate::transport::{InlineButton, Transport};

pub(crate) const CREATING_RECORD_TEXT: &str = "Creating a new record for you ...";
pub(crate) const RECORD_COMPLETE_TEXT: &str = "Record completed. Thank you!";
pub(crate) const NO_KNOWN_STATE_TEXT: &str =
    "I am not sure what that button belongs to; it may have expired. \
     Press /record to start a new record or /graph to see your data.";
pub(crate) const NOT_REGISTERED_TEXT: &str =
    "You are not registered yet. Press /start to set up your metrics.";
const OFFSET_WRONG_STATE_TEXT: &str =
    "You can only use /offset while recording a record. Press /record to create a new record.";
const BASELINES_MISSING_TEXT: &str = "You have not defined baselines for all metrics yet.";

pub struct ConversationService {
    storage: Arc<StorageBackend>,
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionManager>,
}

impl ConversationService {
    pub fn new(
        storage: Arc<StorageBackend>,
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self { storage, transport, sessions }
    }

    /// Handle `/record`: ensure an in-flight record exists, then prompt
    /// for the first unanswered metric. One logical turn, no recursion.
    pub async fn start_recording(&self, user_id: i64) -> Result<(), ServiceError> {
        if self.sessions.temp_record(user_id).is_none() {
            let Some(user) = self.storage.find_user(user_id).await? else {
                self.transport.send_text(user_id, NOT_REGISTERED_TEXT).await?;
                return Ok(());
            };
            if user.metrics.is_empty() {
                return Err(DomainError::NoMetricsConfigured { user_id }.into());
            }
            self.transport.send_text(user_id, CREATING_RECORD_TEXT).await?;
            self.sessions.insert_temp_record(user_id, TempRecord::new(&user.metrics, Utc::now()));
            self.sessions.set_state(user_id, ConversationState::Recording);
            tracing::info!(user_id, "created temporary record");
        }
        self.prompt_next(user_id).await
    }

    /// A button press arriving while the user is recording.
    ///
    /// Unknown-metric and malformed-payload failures abort the turn
    /// without partially applying anything; a missing in-flight record
    /// (expired while the user hesitated) degrades to the guidance text.
    pub async fn handle_record_entry(&self, user_id: i64, payload: &str) -> Result<(), ServiceError> {
        let (metric_name, value) = parse_payload(payload)?;

        let updated = self
            .sessions
            .with_temp_record(user_id, |record| {
                record.update_value(&metric_name, value).map(|()| record.clone())
            });

        let record = match updated {
            None => {
                tracing::warn!(user_id, "button press without an active temporary record");
                self.transport.send_text(user_id, NO_KNOWN_STATE_TEXT).await?;
                return Ok(());
            },
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(record)) => record,
        };
        tracing::info!(user_id, metric = %metric_name, value, "recorded answer");

        if record.is_complete() {
            self.storage
                .create_record(user_id, &record.data_map(), record.timestamp())
                .await?;
            self.sessions.clear(user_id);
            self.transport.send_text(user_id, RECORD_COMPLETE_TEXT).await?;
            tracing::info!(user_id, "record persisted");
        } else {
            self.prompt_next(user_id).await?;
        }
        Ok(())
    }

    /// Handle `/offset <days>`: move the in-flight record's timestamp
    /// into the past. Only meaningful while recording.
    pub async fn offset_timestamp(&self, user_id: i64, days: i64) -> Result<(), ServiceError> {
        let recording =
            matches!(self.sessions.state(user_id), Some(ConversationState::Recording));
        let new_timestamp = recording
            .then(|| self.sessions.with_temp_record(user_id, |record| record.offset_timestamp(days)))
            .flatten();

        match new_timestamp {
            Some(timestamp) => {
                tracing::info!(user_id, %timestamp, "offset record timestamp");
                self.transport
                    .send_text(
                        user_id,
                        &format!(
                            "The timestamp of your record has been updated to {}.",
                            timestamp.format("%Y-%m-%d")
                        ),
                    )
                    .await?;
            },
            None => {
                self.transport.send_text(user_id, OFFSET_WRONG_STATE_TEXT).await?;
            },
        }
        Ok(())
    }

    /// Handle `/baseline`: create a record from every metric's baseline
    /// value, right now, without a conversation.
    pub async fn record_baseline(&self, user_id: i64) -> Result<(), ServiceError> {
        let Some(user) = self.storage.find_user(user_id).await? else {
            self.transport.send_text(user_id, NOT_REGISTERED_TEXT).await?;
            return Ok(());
        };
        if !user.has_baselines_defined() {
            tracing::warn!(user_id, "baseline requested without baselines for every metric");
            self.transport.send_text(user_id, BASELINES_MISSING_TEXT).await?;
            return Ok(());
        }
        let data = baseline_data(&user);
        self.storage.create_record(user_id, &data, Utc::now()).await?;
        tracing::info!(user_id, "baseline record created");
        self.transport.send_text(user_id, &baseline_success_message(&data)).await?;
        Ok(())
    }

    /// Prompt for the first unanswered metric, one button per value in
    /// configuration order.
    async fn prompt_next(&self, user_id: i64) -> Result<(), ServiceError> {
        let Some(record) = self.sessions.temp_record(user_id) else {
            self.transport.send_text(user_id, NO_KNOWN_STATE_TEXT).await?;
            return Ok(());
        };
        let Some(metric) = record.first_unanswered() else {
            // A record with nothing left to ask should have been
            // persisted; surfacing beats prompting into the void.
            return Err(DomainError::NoMetricsConfigured { user_id }.into());
        };

        let keyboard: Vec<Vec<InlineButton>> = metric
            .values
            .iter()
            .map(|v| vec![InlineButton::new(v.label.clone(), format!("{}:{}", metric.name, v.score))])
            .collect();
        self.transport.send_keyboard(user_id, &metric.user_prompt, &keyboard).await?;
        Ok(())
    }
}

/// Split a `metric:value` button payload.
fn parse_payload(payload: &str) -> Result<(String, i64), DomainError> {
    let malformed = || DomainError::MalformedPayload { payload: payload.to_owned() };
    let (name, value) = payload.split_once(':').ok_or_else(malformed)?;
    let value = value.trim().parse().map_err(|_| malformed())?;
    Ok((name.to_owned(), value))
}

/// Every metric's baseline value. Caller has checked
/// `has_baselines_defined`, so the filter drops nothing.
fn baseline_data(user: &User) -> BTreeMap<String, i64> {
    user.metrics
        .iter()
        .filter_map(|m| m.baseline.map(|b| (m.name.clone(), b)))
        .collect()
}

pub(crate) fn baseline_success_message(data: &BTreeMap<String, i64>) -> String {
    let items: Vec<String> = data
        .iter()
        .map(|(name, value)| format!("{} = {value}", capitalize(name)))
        .collect();
    format!("Baseline record successfully created: {}.", items.join(", "))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_splits_on_first_colon() {
        assert_eq!(parse_payload("mood:3").unwrap(), ("mood".to_owned(), 3));
        assert_eq!(parse_payload("sleep:-2").unwrap(), ("sleep".to_owned(), -2));
    }

    #[test]
    fn payload_without_colon_is_malformed() {
        assert!(matches!(
            parse_payload("mood3"),
            Err(DomainError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn payload_with_non_integer_value_is_malformed() {
        assert!(matches!(
            parse_payload("mood:three"),
            Err(DomainError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn baseline_message_lists_capitalized_metrics() {
        let mut data = BTreeMap::new();
        data.insert("mood".to_owned(), 0);
        data.insert("sleep".to_owned(), 8);
        assert_eq!(
            baseline_success_message(&data),
            "Baseline record successfully created: Mood = 0, Sleep = 8."
        );
    }
}
