//! Circuit breaker configuration.

use crate::utils::durations;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error raised when breaker settings are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid circuit breaker settings: {field} {reason}")]
pub struct SettingsError {
    /// The offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// Thresholds and timing for a [`CircuitBreaker`](super::CircuitBreaker).
///
/// Settings are fixed for the lifetime of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Failures needed to open the breaker (default: 3).
    pub failure_threshold: u32,
    /// How long the breaker stays open after the last failure (default: 30s).
    #[serde(rename = "reset_timeout_ms", with = "durations::millis")]
    pub reset_timeout: Duration,
    /// Successes in half-open needed to close again (default: 2).
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(30),
            half_open_success_threshold: 2,
        }
    }
}

impl CircuitBreakerSettings {
    /// Creates settings with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the reset timeout.
    #[must_use]
    pub const fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Sets the half-open success threshold.
    #[must_use]
    pub const fn with_half_open_success_threshold(mut self, threshold: u32) -> Self {
        self.half_open_success_threshold = threshold;
        self
    }

    /// Checks that both thresholds are at least one.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] naming the first zero threshold.
    pub const fn validate(&self) -> Result<(), SettingsError> {
        if self.failure_threshold == 0 {
            return Err(SettingsError {
                field: "failure_threshold",
                reason: "must be >= 1",
            });
        }
        if self.half_open_success_threshold == 0 {
            return Err(SettingsError {
                field: "half_open_success_threshold",
                reason: "must be >= 1",
            });
        }
        Ok(())
    }
}
