//! Service layer for moodtrack
//!
//! Centralizes the conversation state machine, scheduling, and user
//! orchestration between the transport layer and storage.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod conversation;
mod dispatcher;
mod error;
mod graphing;
mod notifier;
mod scheduler;
mod sessions;
#[cfg(test)]
mod test_support;
mod transport;
mod ttl_cache;
mod user_service;

pub use conversation::ConversationService;
pub use dispatcher::Dispatcher;
pub use error::ServiceError;
pub use graphing::GraphingService;
pub use notifier::{auto_baseline_job_id, reminder_job_id, Notifier};
pub use scheduler::JobQueue;
pub use sessions::{ConversationState, SessionManager};
pub use transport::{InlineButton, Transport, TransportError};
pub use ttl_cache::TtlCache;
pub use user_service::{backfill_neutral_records, RegistrationOutcome, UserService};
