//! The graphing flow: ask for a time range, render one chart per calendar
//! month, send each as a photo.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use moodtrack_core::DomainError;
use moodtrack_graph::{months_back, Month, Renderer};
use moodtrack_storage::traits::{RecordStore, UserStore};
use moodtrack_storage::StorageBackend;

use crate::conversation::NOT_REGISTERED_TEXT;
use crate::error::ServiceError;
use crate::sessions::{ConversationState, SessionManager};
use crate::transport::{InlineButton, Transport};

const GRAPH_PROMPT_TEXT: &str = "How many months would you like me to graph?";

pub struct GraphingService {
    storage: Arc<StorageBackend>,
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionManager>,
    renderer: Arc<dyn Renderer>,
    output_dir: PathBuf,
}

impl GraphingService {
    pub fn new(
        storage: Arc<StorageBackend>,
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionManager>,
        renderer: Arc<dyn Renderer>,
        output_dir: PathBuf,
    ) -> Self {
        Self { storage, transport, sessions, renderer, output_dir }
    }

    /// Handle `/graph`: offer the time-range keyboard and hand the user's
    /// next button press to this flow.
    pub async fn start_graphing(&self, user_id: i64) -> Result<(), ServiceError> {
        let keyboard = vec![
            vec![InlineButton::new("Last month", "1")],
            vec![InlineButton::new("Last three months", "3")],
            vec![InlineButton::new("All time", "12")],
        ];
        self.transport.send_keyboard(user_id, GRAPH_PROMPT_TEXT, &keyboard).await?;
        self.sessions.set_state(user_id, ConversationState::Graphing);
        Ok(())
    }

    /// The time-range answer: render and send one chart per month that
    /// has records, oldest first, then leave the graphing flow.
    pub async fn handle_range_selection(
        &self,
        user_id: i64,
        payload: &str,
    ) -> Result<(), ServiceError> {
        let months: u32 = payload
            .trim()
            .parse()
            .map_err(|_| DomainError::MalformedPayload { payload: payload.to_owned() })?;

        let Some(user) = self.storage.find_user(user_id).await? else {
            self.sessions.clear_state(user_id);
            self.transport.send_text(user_id, NOT_REGISTERED_TEXT).await?;
            return Ok(());
        };

        let latest = Month::containing(Utc::now().date_naive());
        for month in months_back(months, latest) {
            let records = self
                .storage
                .find_records_for_time_range(user_id, month.start(), month.end())
                .await?;
            if records.is_empty() {
                tracing::debug!(user_id, %month, "no records, skipping month");
                continue;
            }
            let path = self.renderer.render(&user.metrics, &records, month, &self.output_dir)?;
            self.transport.send_photo(user_id, &path).await?;
        }
        self.sessions.clear_state(user_id);
        Ok(())
    }
}
