//! Instrumented operations for exercising pipelines and breakers.

use crate::errors::{Error, ErrorCode};
use crate::outcome::Outcome;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// An operation that returns a configurable outcome and counts its calls.
#[derive(Debug)]
pub struct CountingOperation<T> {
    outcome: Mutex<Outcome<T>>,
    calls: AtomicUsize,
}

impl<T: Clone> CountingOperation<T> {
    /// Creates an operation that always succeeds with `value`.
    #[must_use]
    pub fn succeeding(value: T) -> Self {
        Self::returning(Outcome::success(value))
    }

    /// Creates an operation that always fails with `code`.
    #[must_use]
    pub fn failing(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::returning(Outcome::failure_with(code, message))
    }

    /// Creates an operation that always returns `outcome`.
    #[must_use]
    pub fn returning(outcome: Outcome<T>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    /// Sets the outcome to return from now on.
    pub fn set_outcome(&self, outcome: Outcome<T>) {
        *self.outcome.lock() = outcome;
    }

    /// Runs the operation.
    pub fn call(&self) -> Outcome<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().clone()
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Resets the call count.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

/// An operation that fails a fixed number of times, then succeeds.
#[derive(Debug)]
pub struct FlakyOperation<T> {
    value: T,
    failures: usize,
    code: ErrorCode,
    calls: AtomicUsize,
}

impl<T: Clone> FlakyOperation<T> {
    /// Fails the first `failures` calls with `NetworkError`, then returns `value`.
    #[must_use]
    pub fn new(failures: usize, value: T) -> Self {
        Self {
            value,
            failures,
            code: ErrorCode::NetworkError,
            calls: AtomicUsize::new(0),
        }
    }

    /// Uses `code` for the injected failures.
    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Runs the operation.
    pub fn call(&self) -> Outcome<T> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Outcome::failure(
                Error::create(self.code, format!("Injected failure {attempt} of {}", self.failures))
                    .with_metadata("attempt", attempt),
            )
        } else {
            Outcome::success(self.value.clone())
        }
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// An operation that takes time before succeeding.
#[derive(Debug, Clone)]
pub struct SlowOperation<T> {
    value: T,
    delay: Duration,
}

impl<T: Clone> SlowOperation<T> {
    /// Creates an operation that succeeds with `value` after `delay`.
    #[must_use]
    pub const fn new(value: T, delay: Duration) -> Self {
        Self { value, delay }
    }

    /// Creates a slow operation with delay in milliseconds.
    #[must_use]
    pub const fn with_delay_ms(value: T, ms: u64) -> Self {
        Self::new(value, Duration::from_millis(ms))
    }

    /// Blocks the current thread for the delay, then succeeds.
    pub fn call(&self) -> Outcome<T> {
        std::thread::sleep(self.delay);
        Outcome::success(self.value.clone())
    }

    /// Sleeps on the tokio timer for the delay, then succeeds.
    pub async fn call_async(&self) -> Outcome<T> {
        tokio::time::sleep(self.delay).await;
        Outcome::success(self.value.clone())
    }
}
