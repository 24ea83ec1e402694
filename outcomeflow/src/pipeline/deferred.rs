//! Pipeline over a producing function that is re-run on every attempt.

use super::builder::PipelineSettings;
use super::retry::{RetryDecision, RetryPolicy, RetryState};
use super::timeout::{duration_ms, run_async_with_timeout, run_blocking_with_timeout};
use crate::errors::{Error, ErrorCode};
use crate::outcome::Outcome;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type Producer<T> = Arc<dyn Fn() -> Outcome<T> + Send + Sync>;

/// A lazily evaluated pipeline.
///
/// Combinators compose onto the producer instead of running immediately, so
/// `build` can re-run the whole chain when an attempt fails. The timeout, when
/// set, applies to each attempt separately.
///
/// # Example
///
/// ```
/// use outcomeflow::prelude::*;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let calls = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&calls);
///
/// let out = Pipeline::deferred(move || {
///     if counter.fetch_add(1, Ordering::SeqCst) < 2 {
///         Outcome::failure_with(ErrorCode::NetworkError, "flaky")
///     } else {
///         Outcome::success(7)
///     }
/// })
/// .map(|x| x * 6)
/// .with_retry(3, Duration::from_millis(1))
/// .build();
///
/// assert_eq!(out, Outcome::success(42));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// ```
#[must_use]
pub struct DeferredPipeline<T> {
    producer: Producer<T>,
    settings: PipelineSettings,
}

impl<T> Clone for DeferredPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            settings: self.settings,
        }
    }
}

impl<T> fmt::Debug for DeferredPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> DeferredPipeline<T> {
    /// Wraps a producing function.
    pub fn from_fn<F>(producer: F) -> Self
    where
        F: Fn() -> Outcome<T> + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
            settings: PipelineSettings::default(),
        }
    }

    /// Returns the timeout and retry settings.
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn compose<U: 'static, G>(self, step: G) -> DeferredPipeline<U>
    where
        G: Fn(Outcome<T>) -> Outcome<U> + Send + Sync + 'static,
    {
        let producer = self.producer;
        DeferredPipeline {
            producer: Arc::new(move || step(producer())),
            settings: self.settings,
        }
    }

    /// Composes [`Outcome::map`] onto the producer.
    pub fn map<U: 'static, F>(self, f: F) -> DeferredPipeline<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.compose(move |outcome| outcome.map(&f))
    }

    /// Composes [`Outcome::bind`] onto the producer.
    pub fn bind<U: 'static, F>(self, f: F) -> DeferredPipeline<U>
    where
        F: Fn(T) -> Outcome<U> + Send + Sync + 'static,
    {
        self.compose(move |outcome| outcome.bind(&f))
    }

    /// Rebinds to another outcome of the same type.
    pub fn then<F>(self, f: F) -> Self
    where
        F: Fn(T) -> Outcome<T> + Send + Sync + 'static,
    {
        self.bind(f)
    }

    /// Composes [`Outcome::validate`] onto the producer.
    pub fn validate<P>(self, predicate: P, code: ErrorCode, message: impl Into<String>) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.compose(move |outcome| outcome.validate(&predicate, code, message.clone()))
    }

    /// Composes [`Outcome::on_success`] onto the producer; runs once per attempt.
    pub fn on_success<F>(self, action: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.compose(move |outcome| outcome.on_success(&action))
    }

    /// Composes [`Outcome::on_failure`] onto the producer; runs once per attempt.
    pub fn on_failure<F>(self, action: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.compose(move |outcome| outcome.on_failure(&action))
    }

    /// Composes [`Outcome::catch`] onto the producer.
    pub fn catch<F>(self, handler: F) -> Self
    where
        F: Fn(Error) -> Outcome<T> + Send + Sync + 'static,
    {
        self.compose(move |outcome| outcome.catch(&handler))
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    /// Sets how many extra attempts to make and the fixed delay between them.
    pub fn with_retry(mut self, count: u32, delay: Duration) -> Self {
        self.settings.retry = RetryPolicy::new(count, delay);
        self
    }

    /// Runs the chain once, ignoring timeout and retry.
    pub fn end(self) -> Outcome<T> {
        (self.producer)()
    }
}

impl<T: Send + 'static> DeferredPipeline<T> {
    /// Runs the chain, retrying failed attempts, blocking the calling thread.
    pub fn build(self) -> Outcome<T> {
        let mut state = RetryState::new(self.settings.retry);
        loop {
            let outcome = match self.settings.timeout {
                Some(timeout) => {
                    let producer = Arc::clone(&self.producer);
                    run_blocking_with_timeout(timeout, move || producer())
                }
                None => (self.producer)(),
            };
            if outcome.is_success() {
                return outcome;
            }
            match state.next_decision() {
                RetryDecision::Retry(delay) => {
                    debug!(
                        attempt = state.used(),
                        delay_ms = duration_ms(delay),
                        error = %error_text(&outcome),
                        "Retrying pipeline after failure"
                    );
                    std::thread::sleep(delay);
                }
                RetryDecision::GiveUp => return outcome,
            }
        }
    }

    /// Async form of [`DeferredPipeline::build`].
    ///
    /// Each attempt runs on the blocking pool. A timed-out attempt keeps
    /// running there; only the wait is abandoned.
    pub async fn build_async(self) -> Outcome<T> {
        let mut state = RetryState::new(self.settings.retry);
        loop {
            let producer = Arc::clone(&self.producer);
            let outcome = run_async_with_timeout(self.settings.timeout, move || producer()).await;
            if outcome.is_success() {
                return outcome;
            }
            match state.next_decision() {
                RetryDecision::Retry(delay) => {
                    debug!(
                        attempt = state.used(),
                        delay_ms = duration_ms(delay),
                        error = %error_text(&outcome),
                        "Retrying pipeline after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => return outcome,
            }
        }
    }
}

fn error_text<T>(outcome: &Outcome<T>) -> String {
    outcome.error().map(ToString::to_string).unwrap_or_default()
}
