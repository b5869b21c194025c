//! Typed error enum for the service layer.
//!
//! Unifies domain, storage, transport, and rendering failures so handlers
//! can match on specific failure modes. `user_message()` implements the
//! propagation policy: validation-class errors turn into user-facing text,
//! infrastructure-class errors stay `None` and are answered with a generic
//! apology by the top-level handler.

use moodtrack_core::DomainError;
use moodtrack_graph::GraphError;
use moodtrack_storage::StorageError;
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain validation failed (unknown metric, malformed payload,
    /// missing precondition).
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    /// Storage operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Outbound delivery failed.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Chart rendering failed.
    #[error("graph: {0}")]
    Graph(#[from] GraphError),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying upstream).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Transport(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The user-facing text for validation-class errors; `None` for
    /// infrastructure-class errors, which get the generic apology.
    pub fn user_message(&self) -> Option<String> {
        let Self::Domain(domain) = self else { return None };
        let text = match domain {
            DomainError::UnknownMetric { name } => {
                format!("\"{name}\" is not part of the record you are filling in. Press /record to start over.")
            },
            DomainError::MalformedPayload { .. } => {
                "I could not make sense of that button. Press /record to start over.".to_owned()
            },
            DomainError::BaselinesNotDefined { missing } => {
                format!(
                    "You need to configure baselines for all metrics first. Missing: {}.",
                    missing.join(", ")
                )
            },
            DomainError::AutoBaselineTimeNotSet => {
                "You need to configure an auto-baseline time first.".to_owned()
            },
            DomainError::NoMetricsConfigured { .. } => {
                "You have no metrics configured, so there is nothing to record.".to_owned()
            },
        };
        Some(text)
    }
}
