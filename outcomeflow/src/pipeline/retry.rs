//! Fixed-delay retry configuration and attempt bookkeeping.

use crate::utils::durations;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many extra attempts a pipeline makes and how long it waits between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first; zero disables retry.
    pub count: u32,
    /// Fixed wait between attempts.
    #[serde(rename = "delay_ms", with = "durations::millis")]
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(count: u32, delay: Duration) -> Self {
        Self { count, delay }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Returns true if at least one retry is allowed.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.count > 0
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No attempts left.
    GiveUp,
}

/// Remaining attempt budget for one `build`.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    remaining: u32,
}

impl RetryState {
    /// Starts with the full budget of `policy`.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            remaining: policy.count,
        }
    }

    /// Consumes one attempt if any remain.
    pub fn next_decision(&mut self) -> RetryDecision {
        if self.remaining == 0 {
            return RetryDecision::GiveUp;
        }
        self.remaining -= 1;
        RetryDecision::Retry(self.policy.delay)
    }

    /// Number of retries not yet used.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Number of retries already used.
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.policy.count - self.remaining
    }
}
