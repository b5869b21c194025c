//! The outbound messaging capability the services program against.
//!
//! The concrete Telegram client lives in its own crate; tests substitute a
//! capturing fake.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// One inline keyboard button: the label the user sees and the opaque
/// payload that comes back when it is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub payload: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { text: text.into(), payload: payload.into() }
    }
}

/// Delivery failures as the service layer sees them. The concrete client
/// has already retried timeouts before any of these surface.
#[derive(Debug, Error)]
pub enum TransportError {
    /// All delivery attempts timed out.
    #[error("delivery timed out after {attempts} attempts")]
    RetryExhausted { attempts: usize },

    /// The transport rejected the message (bad request, blocked bot, ...).
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Connection-level failure.
    #[error("transport failure: {0}")]
    Io(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. } | Self::Io(_))
    }
}

/// Async send capability. Every outbound interaction the core needs.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, user_id: i64, text: &str) -> Result<(), TransportError>;

    /// Send a message with an inline keyboard; one inner `Vec` per row.
    async fn send_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: &[Vec<InlineButton>],
    ) -> Result<(), TransportError>;

    async fn send_photo(&self, user_id: i64, photo: &Path) -> Result<(), TransportError>;
}
