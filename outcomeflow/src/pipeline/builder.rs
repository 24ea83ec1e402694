//! Eager pipeline over an already-evaluated outcome.

use super::retry::{RetryDecision, RetryPolicy, RetryState};
use super::timeout::{duration_ms, run_async_with_timeout, run_blocking_with_timeout};
use super::DeferredPipeline;
use crate::errors::{Error, ErrorCode};
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Timeout and retry configuration carried by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// How long `build` waits before reporting `Timeout`.
    #[serde(default, rename = "timeout_ms", with = "crate::utils::durations::millis_opt")]
    pub timeout: Option<Duration>,
    /// Retry budget applied by `build` when no timeout is set.
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// A pipeline whose value is computed as each combinator is applied.
///
/// Every combinator consumes the pipeline and returns a new one with the same
/// settings. `build` then applies the timeout or retry settings to the final
/// outcome.
///
/// Retry here re-checks the same outcome after each delay, so it can only
/// succeed if the first evaluation already did. Use [`DeferredPipeline`] to
/// re-run the producing function on every attempt.
///
/// # Example
///
/// ```
/// use outcomeflow::prelude::*;
///
/// let out = Pipeline::start(20)
///     .map(|x| x + 1)
///     .validate(|x| *x > 0, ErrorCode::ValidationError, "must be positive")
///     .then(|x| Outcome::success(x * 2))
///     .end();
///
/// assert_eq!(out, Outcome::success(42));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct Pipeline<T> {
    current: Outcome<T>,
    settings: PipelineSettings,
}

impl<T> Pipeline<T> {
    /// Starts a pipeline from a plain value.
    pub fn start(value: T) -> Self {
        Self::from_outcome(Outcome::Success(value))
    }

    /// Starts a pipeline from an existing outcome.
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            current: outcome,
            settings: PipelineSettings::default(),
        }
    }

    /// Starts a pipeline that re-runs `producer` on every attempt.
    pub fn deferred<F>(producer: F) -> DeferredPipeline<T>
    where
        T: 'static,
        F: Fn() -> Outcome<T> + Send + Sync + 'static,
    {
        DeferredPipeline::from_fn(producer)
    }

    /// Returns the outcome computed so far.
    pub const fn current(&self) -> &Outcome<T> {
        &self.current
    }

    /// Returns the timeout and retry settings.
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Applies [`Outcome::map`].
    pub fn map<U, F>(self, f: F) -> Pipeline<U>
    where
        F: FnOnce(T) -> U,
    {
        let settings = self.settings;
        Pipeline {
            current: self.current.map(f),
            settings,
        }
    }

    /// Applies [`Outcome::bind`].
    pub fn bind<U, F>(self, f: F) -> Pipeline<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        let settings = self.settings;
        Pipeline {
            current: self.current.bind(f),
            settings,
        }
    }

    /// Rebinds to another outcome of the same type.
    pub fn then<F>(self, f: F) -> Self
    where
        F: FnOnce(T) -> Outcome<T>,
    {
        self.bind(f)
    }

    /// Applies [`Outcome::validate`].
    pub fn validate<P>(self, predicate: P, code: ErrorCode, message: impl Into<String>) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        let Self { current, settings } = self;
        Self {
            current: current.validate(predicate, code, message),
            settings,
        }
    }

    /// Applies [`Outcome::on_success`].
    pub fn on_success<F>(self, action: F) -> Self
    where
        F: FnOnce(&T),
    {
        let Self { current, settings } = self;
        Self {
            current: current.on_success(action),
            settings,
        }
    }

    /// Applies [`Outcome::on_failure`].
    pub fn on_failure<F>(self, action: F) -> Self
    where
        F: FnOnce(&Error),
    {
        let Self { current, settings } = self;
        Self {
            current: current.on_failure(action),
            settings,
        }
    }

    /// Applies [`Outcome::catch`].
    pub fn catch<F>(self, handler: F) -> Self
    where
        F: FnOnce(Error) -> Outcome<T>,
    {
        let Self { current, settings } = self;
        Self {
            current: current.catch(handler),
            settings,
        }
    }

    /// Sets how long `build` waits for the outcome.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    /// Sets the retry budget and the fixed delay between attempts.
    pub fn with_retry(mut self, count: u32, delay: Duration) -> Self {
        self.settings.retry = RetryPolicy::new(count, delay);
        self
    }

    /// Returns the outcome without applying timeout or retry.
    pub fn end(self) -> Outcome<T> {
        self.current
    }
}

impl<T: Send + 'static> Pipeline<T> {
    /// Produces the final outcome, blocking the calling thread.
    ///
    /// With a timeout, the outcome is handed over from a background thread and
    /// `Failure(Timeout, "Operation timed out")` is returned if that takes
    /// longer than the limit. Otherwise, with a retry budget, a failed outcome
    /// is re-checked after each delay until the budget runs out.
    pub fn build(self) -> Outcome<T> {
        let Self { current, settings } = self;

        if let Some(timeout) = settings.timeout {
            return run_blocking_with_timeout(timeout, move || current);
        }

        let mut state = RetryState::new(settings.retry);
        while current.is_failure() {
            match state.next_decision() {
                RetryDecision::Retry(delay) => {
                    debug!(
                        attempt = state.used(),
                        delay_ms = duration_ms(delay),
                        "Re-checking failed outcome after delay"
                    );
                    std::thread::sleep(delay);
                }
                RetryDecision::GiveUp => break,
            }
        }
        current
    }

    /// Async form of [`Pipeline::build`]; sleeps the task instead of the thread.
    pub async fn build_async(self) -> Outcome<T> {
        let Self { current, settings } = self;

        if settings.timeout.is_some() {
            return run_async_with_timeout(settings.timeout, move || current).await;
        }

        let mut state = RetryState::new(settings.retry);
        while current.is_failure() {
            match state.next_decision() {
                RetryDecision::Retry(delay) => {
                    debug!(
                        attempt = state.used(),
                        delay_ms = duration_ms(delay),
                        "Re-checking failed outcome after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => break,
            }
        }
        current
    }
}

impl<T> From<Outcome<T>> for Pipeline<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self::from_outcome(outcome)
    }
}
