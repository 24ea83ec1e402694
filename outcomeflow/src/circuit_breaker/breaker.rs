//! Guarded execution of an unreliable operation.

use super::state::{Admission, BreakerState, Transition};
use super::{CircuitBreakerSettings, CircuitState, SettingsError};
use crate::errors::{Error, ErrorCode};
use crate::metrics::MetricsRegistry;
use crate::outcome::Outcome;
use crate::utils::{now_utc, Timestamp};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Point-in-time view of a breaker, for inspection and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    /// Breaker name.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Failures recorded since the breaker last closed.
    pub failure_count: u32,
    /// Successes recorded in the current half-open period.
    pub half_open_success_count: u32,
    /// When the last failure was recorded.
    pub last_failure_time: Option<Timestamp>,
}

/// A circuit breaker guarding calls to an operation that returns an [`Outcome`].
///
/// The lock is held only while the state is inspected or updated, never while
/// the operation runs, so concurrent calls proceed in parallel. While half-open,
/// the gate hands out at most as many trial permits as successes are still
/// needed to close; other callers are rejected as if the breaker were open.
///
/// # Example
///
/// ```
/// use outcomeflow::prelude::*;
///
/// let breaker = CircuitBreaker::new("inventory", CircuitBreakerSettings::default());
///
/// let out = breaker.execute(|| Outcome::success(12));
/// assert_eq!(out, Outcome::success(12));
/// assert_eq!(breaker.state(), CircuitState::Closed);
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: CircuitBreakerSettings,
    state: Mutex<BreakerState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl CircuitBreaker {
    /// Creates a breaker in the closed state.
    #[must_use]
    pub fn new(name: impl Into<String>, settings: CircuitBreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            state: Mutex::new(BreakerState::new()),
            metrics: None,
        }
    }

    /// Creates a breaker after validating its settings.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a threshold is zero.
    pub fn try_new(
        name: impl Into<String>,
        settings: CircuitBreakerSettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::new(name, settings))
    }

    /// Records every call into `registry` under this breaker's name.
    #[must_use]
    pub fn with_metrics(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Returns the breaker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the breaker settings.
    #[must_use]
    pub const fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Returns the failures recorded since the breaker last closed.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Returns when the last failure was recorded.
    #[must_use]
    pub fn last_failure_time(&self) -> Option<Timestamp> {
        self.state.lock().last_failure_time
    }

    /// Returns the successes recorded in the current half-open period.
    #[must_use]
    pub fn half_open_success_count(&self) -> u32 {
        self.state.lock().half_open_success_count
    }

    /// Returns a consistent view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: state.state,
            failure_count: state.failure_count,
            half_open_success_count: state.half_open_success_count,
            last_failure_time: state.last_failure_time,
        }
    }

    /// Forces the breaker closed and clears its counters.
    pub fn reset(&self) {
        let transition = self.state.lock().reset();
        if let Some(transition) = transition {
            self.log_transition(transition, "manual reset");
        }
    }

    /// Runs `operation` unless the breaker is open.
    ///
    /// A panic inside `operation` is caught and reported as
    /// `Failure(CircuitBreakerError, ..)`; it counts as a failure.
    pub fn execute<T, F>(&self, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Outcome<T>,
    {
        let permit = match self.acquire() {
            Ok(permit) => permit,
            Err(rejected) => return rejected,
        };

        let started = Instant::now();
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(operation))
            .unwrap_or_else(|payload| self.panic_failure(payload.as_ref()));
        self.record(permit, &outcome, started.elapsed());
        outcome
    }

    /// Async form of [`CircuitBreaker::execute`].
    ///
    /// Suspends only while awaiting the operation. The state lock is never
    /// held across that await. Dropping the future before it completes hands a
    /// half-open trial permit back without recording a result.
    pub async fn execute_async<T, F, Fut>(&self, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let permit = match self.acquire() {
            Ok(permit) => permit,
            Err(rejected) => return rejected,
        };

        let started = Instant::now();
        let outcome = AssertUnwindSafe(async move { operation().await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| self.panic_failure(payload.as_ref()));
        self.record(permit, &outcome, started.elapsed());
        outcome
    }

    fn acquire<T>(&self) -> Result<Permit<'_>, Outcome<T>> {
        let decision = self.state.lock().admit(Instant::now(), &self.settings);
        match decision {
            Ok((admission, transition)) => {
                if let Some(transition) = transition {
                    self.log_transition(transition, "reset timeout elapsed");
                }
                Ok(Permit {
                    breaker: self,
                    admission: Some(admission),
                })
            }
            Err(transition) => {
                if let Some(transition) = transition {
                    self.log_transition(transition, "reset timeout elapsed");
                }
                debug!(operation = %self.name, "Circuit breaker rejected call");
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(&self.name);
                }
                Err(Outcome::failure(
                    Error::create(
                        ErrorCode::CircuitBreakerOpen,
                        format!("Circuit breaker is open for operation: {}", self.name),
                    )
                    .with_metadata("operation", self.name.as_str()),
                ))
            }
        }
    }

    fn record<T>(&self, mut permit: Permit<'_>, outcome: &Outcome<T>, elapsed: Duration) {
        let Some(admission) = permit.admission.take() else {
            return;
        };
        let transition = {
            let mut state = self.state.lock();
            if outcome.is_success() {
                state.record_success(admission, &self.settings)
            } else {
                state.record_failure(admission, Instant::now(), now_utc(), &self.settings)
            }
        };

        if let Some(error) = outcome.error() {
            warn!(operation = %self.name, error = %error, "Protected operation failed");
        }
        if let Some(transition) = transition {
            let reason = if outcome.is_success() {
                "half-open success threshold reached"
            } else {
                "failure threshold reached"
            };
            self.log_transition(transition, reason);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_call(&self.name, outcome.is_success(), elapsed);
        }
    }

    fn panic_failure<T>(&self, payload: &(dyn Any + Send)) -> Outcome<T> {
        let detail = panic_message(payload);
        warn!(operation = %self.name, panic = %detail, "Protected operation panicked");
        Outcome::failure(
            Error::create(
                ErrorCode::CircuitBreakerError,
                format!("Operation {} panicked: {detail}", self.name),
            )
            .with_metadata("operation", self.name.as_str()),
        )
    }

    fn log_transition(&self, transition: Transition, reason: &str) {
        info!(
            operation = %self.name,
            from = %transition.from,
            to = %transition.to,
            reason,
            "Circuit breaker state changed"
        );
    }
}

/// Admission held while the operation runs.
///
/// If it is dropped before the result is recorded, a trial permit goes back to
/// the breaker so an abandoned call cannot keep the half-open gate shut.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Option<Admission>,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if let Some(admission @ Admission::Trial { .. }) = self.admission.take() {
            self.breaker.state.lock().release(admission);
            debug!(operation = %self.breaker.name, "Half-open trial abandoned before completion");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
