//! Asynchronous mirrors of the `Outcome` combinators.
//!
//! Each method here matches a synchronous combinator one-to-one; the supplied
//! function returns a future instead of a value. Failures never poll the
//! future-producing function.

use super::Outcome;
use crate::errors::{Error, ErrorCode};
use std::future::Future;

impl<T> Outcome<T> {
    /// Awaits `f` and converts an `Err` into a failure using `translate`.
    pub async fn try_with_async<E, F, Fut, X>(f: F, translate: X) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        X: FnOnce(E) -> Error,
    {
        match f().await {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(translate(err)),
        }
    }

    /// Async form of [`Outcome::map`].
    pub async fn map_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        match self {
            Self::Success(value) => Outcome::Success(f(value).await),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Async form of [`Outcome::bind`].
    pub async fn bind_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        match self {
            Self::Success(value) => f(value).await,
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Async form of [`Outcome::validate`].
    pub async fn validate_async<P, Fut>(
        self,
        predicate: P,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        match self {
            Self::Success(value) => {
                if predicate(&value).await {
                    Self::Success(value)
                } else {
                    Self::failure_with(code, message)
                }
            }
            failure @ Self::Failure(_) => failure,
        }
    }

    /// Async form of [`Outcome::match_with`].
    pub async fn match_async<R, S, SFut, F, FFut>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> SFut,
        SFut: Future<Output = R>,
        F: FnOnce(Error) -> FFut,
        FFut: Future<Output = R>,
    {
        match self {
            Self::Success(value) => on_success(value).await,
            Self::Failure(error) => on_failure(error).await,
        }
    }

    /// Async form of [`Outcome::on_success`].
    pub async fn on_success_async<F, Fut>(self, action: F) -> Self
    where
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Self::Success(value) = &self {
            action(value).await;
        }
        self
    }

    /// Async form of [`Outcome::on_failure`].
    pub async fn on_failure_async<F, Fut>(self, action: F) -> Self
    where
        F: FnOnce(&Error) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Self::Failure(error) = &self {
            action(error).await;
        }
        self
    }

    /// Async form of [`Outcome::catch`].
    pub async fn catch_async<F, Fut>(self, handler: F) -> Self
    where
        F: FnOnce(Error) -> Fut,
        Fut: Future<Output = Self>,
    {
        match self {
            Self::Success(value) => Self::Success(value),
            Self::Failure(error) => handler(error).await,
        }
    }

    /// Async form of [`Outcome::value_or_else`].
    pub async fn value_or_else_async<F, Fut>(self, fallback: F) -> T
    where
        F: FnOnce(Error) -> Fut,
        Fut: Future<Output = T>,
    {
        match self {
            Self::Success(value) => value,
            Self::Failure(error) => fallback(error).await,
        }
    }
}

/// Awaits two outcome futures in order, returning the first failure.
///
/// `b` is not awaited when `a` fails.
pub async fn combine_async<A, B, FA, FB>(a: FA, b: FB) -> Outcome<(A, B)>
where
    FA: Future<Output = Outcome<A>>,
    FB: Future<Output = Outcome<B>>,
{
    match a.await {
        Outcome::Success(a) => b.await.map(|b| (a, b)),
        Outcome::Failure(error) => Outcome::Failure(error),
    }
}

/// Awaits a sequence of outcome futures one at a time, stopping at the first failure.
pub async fn combine_all_async<T, I, Fut>(futures: I) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Outcome<T>>,
{
    let mut values = Vec::new();
    for fut in futures {
        match fut.await {
            Outcome::Success(value) => values.push(value),
            Outcome::Failure(error) => return Outcome::Failure(error),
        }
    }
    Outcome::Success(values)
}
