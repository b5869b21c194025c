//! Bot API wire types, trimmed to the fields this bot reads, plus the
//! typed inbound events the dispatch loop consumes.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub from: Option<TgUser>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUser {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

/// An inbound interaction, already reduced to what the handlers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/command arg arg ...`
    Command { user_id: i64, command: String, args: Vec<String> },
    /// A button press carrying its opaque payload.
    ButtonPress { user_id: i64, payload: String },
}

impl Update {
    /// Reduce a raw update to an event, if it is one this bot handles.
    pub(crate) fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let payload = query.data?;
            return Some(InboundEvent::ButtonPress { user_id: query.from.id, payload });
        }
        let message = self.message?;
        let user_id = message.from?.id;
        let text = message.text?;
        let command_line = text.strip_prefix('/')?;
        let mut parts = command_line.split_whitespace();
        let command = parts.next()?.to_owned();
        let args = parts.map(str::to_owned).collect();
        Some(InboundEvent::Command { user_id, command, args })
    }
}
