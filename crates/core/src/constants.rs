//! Shared constants for moodtrack.
//!
//! Centralizes knobs that would otherwise be duplicated across crates.

/// How long an unfinished record survives in memory before it is dropped.
pub const TEMP_RECORD_TTL_SECS: u64 = 300;

/// How long a user's conversation state (recording/graphing) survives.
/// Kept equal to the temp-record TTL so both usually expire together; the
/// dispatcher tolerates them expiring independently.
pub const CONVERSATION_STATE_TTL_SECS: u64 = 300;

/// Maximum delivery attempts for an outbound message.
pub const SEND_MAX_ATTEMPTS: usize = 3;

/// Fixed backoff between delivery attempts, in seconds.
pub const SEND_RETRY_BACKOFF_SECS: u64 = 1;

/// Reminder text used when a notification has no text of its own.
pub const DEFAULT_REMINDER_TEXT: &str = "Hi! It's time to record your mood :)";

/// Long-poll timeout for the update stream, in seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Directory rendered graphs are written to.
pub const GRAPH_OUTPUT_DIR: &str = "graphs";
