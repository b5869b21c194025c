//! Telegram Bot API transport.
//!
//! A thin reqwest client over the Bot API: outbound sends (with a bounded
//! retry on timeouts) implementing the service layer's [`Transport`]
//! trait, and a long-poll update stream producing typed inbound events.
//!
//! [`Transport`]: moodtrack_service::Transport

mod client;
mod error;
mod poller;
mod types;

pub use client::BotClient;
pub use error::TelegramError;
pub use poller::UpdatePoller;
pub use types::InboundEvent;
