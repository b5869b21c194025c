//! Typed domain errors.
//!
//! Validation-class failures that handlers convert into user-facing text.
//! Infrastructure-class failures live in the storage and telegram crates.

use thiserror::Error;

/// Errors raised by the domain model itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An answer referenced a metric that is not part of the record's
    /// metric snapshot (stale prompt after a configuration change).
    #[error("unknown metric: {name}")]
    UnknownMetric { name: String },

    /// A button payload could not be split into metric name and value.
    #[error("malformed payload: {payload}")]
    MalformedPayload { payload: String },

    /// Auto-baseline requires a baseline on every metric; these lack one.
    #[error("baselines not defined for: {}", missing.join(", "))]
    BaselinesNotDefined { missing: Vec<String> },

    /// Auto-baseline requires a configured time of day.
    #[error("auto-baseline time not configured")]
    AutoBaselineTimeNotSet,

    /// A user has no metrics configured at all, so there is nothing to
    /// prompt for. A configuration error, not a conversation state.
    #[error("no metrics configured for user {user_id}")]
    NoMetricsConfigured { user_id: i64 },
}
