use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A daily reminder: a UTC time of day and the message to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub time: NaiveTime,
    #[serde(default)]
    pub text: String,
}

/// Whether baseline records are created automatically, and when.
///
/// Deserialization goes through [`AutoBaselineConfig::new`], so an enabled
/// config without a time cannot be constructed, not even from a stored
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAutoBaselineConfig")]
pub struct AutoBaselineConfig {
    enabled: bool,
    time: Option<NaiveTime>,
}

#[derive(Deserialize)]
struct RawAutoBaselineConfig {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    time: Option<NaiveTime>,
}

impl TryFrom<RawAutoBaselineConfig> for AutoBaselineConfig {
    type Error = DomainError;

    fn try_from(raw: RawAutoBaselineConfig) -> Result<Self, Self::Error> {
        Self::new(raw.enabled, raw.time)
    }
}

impl AutoBaselineConfig {
    /// Build a config, rejecting `enabled` without a `time`.
    pub fn new(enabled: bool, time: Option<NaiveTime>) -> Result<Self, DomainError> {
        if enabled && time.is_none() {
            return Err(DomainError::AutoBaselineTimeNotSet);
        }
        Ok(Self { enabled, time })
    }

    /// A disabled config that may still carry a preconfigured time.
    pub fn disabled(time: Option<NaiveTime>) -> Self {
        Self { enabled: false, time }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// Enable; fails when no time is configured.
    pub fn enable(&mut self) -> Result<(), DomainError> {
        if self.time.is_none() {
            return Err(DomainError::AutoBaselineTimeNotSet);
        }
        self.enabled = true;
        Ok(())
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

impl Default for AutoBaselineConfig {
    fn default() -> Self {
        Self { enabled: false, time: None }
    }
}
