use moodtrack_core::POLL_TIMEOUT_SECS;

use crate::client::BotClient;
use crate::error::TelegramError;
use crate::types::{InboundEvent, Update};

/// Long-poll update stream. Tracks the `getUpdates` offset so every
/// update is delivered exactly once per process.
pub struct UpdatePoller {
    client: BotClient,
    offset: i64,
}

impl UpdatePoller {
    pub fn new(client: BotClient) -> Self {
        Self { client, offset: 0 }
    }

    /// The next batch of inbound events. Blocks for up to the poll
    /// timeout; an empty batch just means nothing happened.
    pub async fn next_events(&mut self) -> Result<Vec<InboundEvent>, TelegramError> {
        let payload = serde_json::json!({
            "offset": self.offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        let updates: Vec<Update> = self.client.call("getUpdates", &payload).await?;

        let mut events = Vec::new();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            if let Some(query) = &update.callback_query {
                // Ack so the client stops its loading spinner; a failed
                // ack is cosmetic and must not drop the event.
                if let Err(error) = self.client.answer_callback_query(&query.id).await {
                    tracing::warn!(%error, "failed to answer callback query");
                }
            }
            if let Some(event) = update.into_event() {
                events.push(event);
            }
        }
        Ok(events)
    }
}
