//! Per-operation call statistics.
//!
//! A [`MetricsRegistry`] is an ordinary owned value. Share it with `Arc` between
//! the components that should record into the same tally; drop it and the
//! numbers go with it.

use crate::outcome::Outcome;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Counters for one named operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStats {
    /// Calls that ran.
    pub calls: u64,
    /// Calls that returned a success.
    pub successes: u64,
    /// Calls that returned a failure.
    pub failures: u64,
    /// Calls rejected without running.
    pub rejections: u64,
    /// Time spent in calls that ran.
    #[serde(rename = "total_duration_ms", with = "crate::utils::durations::millis")]
    pub total_duration: Duration,
}

impl OperationStats {
    /// Mean duration of calls that ran.
    #[must_use]
    pub fn average_duration(&self) -> Duration {
        u32::try_from(self.calls)
            .ok()
            .filter(|calls| *calls > 0)
            .map_or(Duration::ZERO, |calls| self.total_duration / calls)
    }

    /// Fraction of calls that failed, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.failures as f64 / self.calls as f64
        }
    }
}

/// Concurrent registry of [`OperationStats`] keyed by operation name.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    operations: DashMap<String, OperationStats>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call that ran.
    pub fn record_call(&self, name: &str, success: bool, duration: Duration) {
        let mut stats = self.operations.entry(name.to_string()).or_default();
        stats.calls += 1;
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        stats.total_duration += duration;
    }

    /// Records a call that was rejected before running.
    pub fn record_rejection(&self, name: &str) {
        self.operations.entry(name.to_string()).or_default().rejections += 1;
    }

    /// Runs `operation`, recording its duration and outcome under `name`.
    pub fn measure<T, F>(&self, name: &str, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Outcome<T>,
    {
        let started = Instant::now();
        let outcome = operation();
        self.record_call(name, outcome.is_success(), started.elapsed());
        outcome
    }

    /// Returns a copy of the stats for `name`.
    #[must_use]
    pub fn snapshot(&self, name: &str) -> Option<OperationStats> {
        self.operations.get(name).map(|entry| *entry.value())
    }

    /// Returns a copy of every operation's stats.
    #[must_use]
    pub fn snapshot_all(&self) -> HashMap<String, OperationStats> {
        self.operations
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Clears all counters.
    pub fn reset(&self) {
        self.operations.clear();
    }

    /// Number of operations seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
