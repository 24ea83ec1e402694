//! The `Outcome` type and its synchronous combinators.

use crate::errors::{Error, ErrorCode};
use serde::{Deserialize, Serialize};

/// The result of a computation: exactly one of a value or an [`Error`].
///
/// Outcomes are immutable. Every combinator consumes the outcome and returns a
/// new one; none of them panic on their own. A `Failure` flows through
/// `map`, `bind` and `validate` untouched, carrying the very same error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "lowercase")]
#[must_use = "an outcome may be a failure that should be handled"]
pub enum Outcome<T> {
    /// The computation produced a value.
    Success(T),
    /// The computation failed.
    Failure(Error),
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    pub const fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Creates a failed outcome.
    pub const fn failure(error: Error) -> Self {
        Self::Failure(error)
    }

    /// Creates a failed outcome from a code and message.
    pub fn failure_with(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure(Error::create(code, message))
    }

    /// Runs `f` and converts an `Err` into a failure using `translate`.
    pub fn try_with<E, F, X>(f: F, translate: X) -> Self
    where
        F: FnOnce() -> Result<T, E>,
        X: FnOnce(E) -> Error,
    {
        match f() {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(translate(err)),
        }
    }

    /// Returns true for `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true for `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrows the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrows the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Transforms the value of a success.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Chains a computation that itself returns an outcome.
    pub fn bind<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Turns a success into `Failure(code, message)` when `predicate` rejects it.
    pub fn validate<P>(self, predicate: P, code: ErrorCode, message: impl Into<String>) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        match self {
            Self::Success(value) => {
                if predicate(&value) {
                    Self::Success(value)
                } else {
                    Self::failure_with(code, message)
                }
            }
            failure @ Self::Failure(_) => failure,
        }
    }

    /// Folds the outcome into a single value, calling exactly one branch.
    pub fn match_with<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> R,
        F: FnOnce(Error) -> R,
    {
        match self {
            Self::Success(value) => on_success(value),
            Self::Failure(error) => on_failure(error),
        }
    }

    /// Runs `action` on the value of a success and returns the outcome unchanged.
    pub fn on_success<F>(self, action: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let Self::Success(value) = &self {
            action(value);
        }
        self
    }

    /// Runs `action` on the error of a failure and returns the outcome unchanged.
    pub fn on_failure<F>(self, action: F) -> Self
    where
        F: FnOnce(&Error),
    {
        if let Self::Failure(error) = &self {
            action(error);
        }
        self
    }

    /// Recovers from a failure by handing its error to `handler`.
    pub fn catch<F>(self, handler: F) -> Self
    where
        F: FnOnce(Error) -> Self,
    {
        match self {
            Self::Success(value) => Self::Success(value),
            Self::Failure(error) => handler(error),
        }
    }

    /// Transforms the error of a failure.
    pub fn map_error<F>(self, f: F) -> Self
    where
        F: FnOnce(Error) -> Error,
    {
        match self {
            Self::Success(value) => Self::Success(value),
            Self::Failure(error) => Self::Failure(f(error)),
        }
    }

    /// Returns the value, or `default` for a failure.
    pub fn value_or(self, default: T) -> T {
        match self {
            Self::Success(value) => value,
            Self::Failure(_) => default,
        }
    }

    /// Returns the value, or computes a fallback from the error.
    pub fn value_or_else<F>(self, fallback: F) -> T
    where
        F: FnOnce(Error) -> T,
    {
        match self {
            Self::Success(value) => value,
            Self::Failure(error) => fallback(error),
        }
    }

    /// Leaves the outcome world: the value, or the error for `?` to propagate.
    ///
    /// This is the only combinator that hands an error back to ordinary
    /// error propagation.
    ///
    /// # Errors
    ///
    /// Returns the carried [`Error`] when called on a failure.
    pub fn value_or_raise(self) -> Result<T, Error> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Returns the value, or `T::default()` for a failure.
    pub fn value_or_default(self) -> T {
        self.value_or_else(|_| T::default())
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Error> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.value_or_raise()
    }
}

/// Pairs two outcomes, returning the first failure in argument order.
pub fn combine<A, B>(a: Outcome<A>, b: Outcome<B>) -> Outcome<(A, B)> {
    a.bind(|a| b.map(|b| (a, b)))
}

/// Collects a sequence of outcomes, stopping at the first failure.
///
/// Outcomes after the first failure are not pulled from the iterator.
pub fn combine_all<T, I>(outcomes: I) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = Outcome<T>>,
{
    let iter = outcomes.into_iter();
    let mut values = Vec::with_capacity(iter.size_hint().0);
    for outcome in iter {
        match outcome {
            Outcome::Success(value) => values.push(value),
            Outcome::Failure(error) => return Outcome::Failure(error),
        }
    }
    Outcome::Success(values)
}

impl<T> FromIterator<Outcome<T>> for Outcome<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Outcome<T>>>(iter: I) -> Self {
        combine_all(iter)
    }
}
