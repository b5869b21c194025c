//! Per-user conversation session state.
//!
//! Two independent TTL maps: the in-flight record accumulator and the
//! conversation state that routes button presses. They usually expire
//! together but nothing relies on it; every consumer tolerates one being
//! present without the other and treats that as "no known state".

use std::time::Duration;

use moodtrack_core::{
    TempRecord, CONVERSATION_STATE_TTL_SECS, TEMP_RECORD_TTL_SECS,
};

use crate::ttl_cache::TtlCache;

/// Which multi-turn flow currently owns a user's button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Recording,
    Graphing,
}

pub struct SessionManager {
    temp_records: TtlCache<i64, TempRecord>,
    states: TtlCache<i64, ConversationState>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_ttls(
            Duration::from_secs(TEMP_RECORD_TTL_SECS),
            Duration::from_secs(CONVERSATION_STATE_TTL_SECS),
        )
    }

    /// Explicit TTLs, for tests and env overrides.
    pub fn with_ttls(record_ttl: Duration, state_ttl: Duration) -> Self {
        Self {
            temp_records: TtlCache::new(record_ttl),
            states: TtlCache::new(state_ttl),
        }
    }

    pub fn temp_record(&self, user_id: i64) -> Option<TempRecord> {
        self.temp_records.get(&user_id)
    }

    /// Store a fresh in-flight record, discarding any previous one.
    pub fn insert_temp_record(&self, user_id: i64, record: TempRecord) {
        self.temp_records.insert(user_id, record);
    }

    /// Mutate the in-flight record without extending its TTL window.
    pub fn with_temp_record<R>(
        &self,
        user_id: i64,
        f: impl FnOnce(&mut TempRecord) -> R,
    ) -> Option<R> {
        self.temp_records.with_mut(&user_id, f)
    }

    pub fn state(&self, user_id: i64) -> Option<ConversationState> {
        self.states.get(&user_id)
    }

    /// Set the active flow. Starting one flow while another is active
    /// overwrites it: last command wins, no stacking.
    pub fn set_state(&self, user_id: i64, state: ConversationState) {
        self.states.insert(user_id, state);
    }

    pub fn clear_state(&self, user_id: i64) {
        self.states.remove(&user_id);
    }

    /// Drop everything for a user, e.g. after a record is persisted.
    pub fn clear(&self, user_id: i64) {
        self.temp_records.remove(&user_id);
        self.states.remove(&user_id);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
