//! Typed error enum for the Telegram client.

use moodtrack_service::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The response body did not parse as the expected shape.
    #[error("unexpected response in {context}: {source}")]
    UnexpectedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Every delivery attempt timed out.
    #[error("all {attempts} delivery attempts timed out")]
    RetriesExhausted { attempts: usize },

    /// Reading a photo off disk failed.
    #[error("cannot read photo {path}: {source}")]
    PhotoRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TelegramError {
    /// Whether this is a timeout-class failure the send path retries.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HttpRequest(e) if e.is_timeout() || e.is_connect())
    }
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::RetriesExhausted { attempts } => Self::RetryExhausted { attempts },
            TelegramError::Api { code, description } => {
                Self::Rejected(format!("{code}: {description}"))
            },
            other => Self::Io(other.to_string()),
        }
    }
}
