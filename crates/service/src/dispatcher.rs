//! Routes button presses to whichever flow currently owns them.
//!
//! A single callback handler receives every button press; the per-user
//! conversation state decides whether it belongs to the recording or the
//! graphing flow. Unknown or expired state is an expected condition and
//! degrades to a fixed guidance message, never an error.

use std::sync::Arc;

use crate::conversation::{ConversationService, NO_KNOWN_STATE_TEXT};
use crate::error::ServiceError;
use crate::graphing::GraphingService;
use crate::sessions::{ConversationState, SessionManager};
use crate::transport::Transport;

pub struct Dispatcher {
    sessions: Arc<SessionManager>,
    conversation: Arc<ConversationService>,
    graphing: Arc<GraphingService>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionManager>,
        conversation: Arc<ConversationService>,
        graphing: Arc<GraphingService>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self { sessions, conversation, graphing, transport }
    }

    pub async fn handle_button(&self, user_id: i64, payload: &str) -> Result<(), ServiceError> {
        match self.sessions.state(user_id) {
            Some(ConversationState::Recording) => {
                self.conversation.handle_record_entry(user_id, payload).await
            },
            Some(ConversationState::Graphing) => {
                self.graphing.handle_range_selection(user_id, payload).await
            },
            None => {
                tracing::debug!(user_id, "button press with no active conversation");
                self.transport.send_text(user_id, NO_KNOWN_STATE_TEXT).await?;
                Ok(())
            },
        }
    }
}
