//! # Outcomeflow
//!
//! Typed outcomes for code that can fail, with a fluent pipeline builder and a
//! thread-safe circuit breaker.
//!
//! Outcomeflow provides:
//!
//! - **Outcomes**: `Success(value)` or `Failure(error)` with a closed set of error codes
//! - **Combinators**: map, bind, validate, catch and side-effect hooks, sync and async
//! - **Pipelines**: fluent chains with optional timeout and fixed-delay retry
//! - **Circuit breaker**: Closed/Open/HalfOpen gate around an unreliable operation
//! - **Validation and metrics**: field error accumulation and per-operation counters
//!
//! ## Quick Start
//!
//! ```rust
//! use outcomeflow::prelude::*;
//!
//! let parsed = Pipeline::start("42".to_string())
//!     .bind(|s| match s.parse::<i32>() {
//!         Ok(n) => Outcome::success(n),
//!         Err(_) => Outcome::failure_with(ErrorCode::ValidationError, "not a number"),
//!     })
//!     .validate(|n| *n > 0, ErrorCode::ValidationError, "must be positive")
//!     .map(|n| n * 2)
//!     .end();
//! assert_eq!(parsed, Outcome::success(84));
//!
//! let breaker = CircuitBreaker::new("parser", CircuitBreakerSettings::default());
//! let guarded = breaker.execute(|| parsed.clone());
//! assert!(guarded.is_success());
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod circuit_breaker;
pub mod errors;
pub mod metrics;
pub mod observability;
pub mod outcome;
pub mod pipeline;
pub mod testing;
pub mod utils;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::circuit_breaker::{
        BreakerSnapshot, CircuitBreaker, CircuitBreakerSettings, CircuitState,
    };
    pub use crate::errors::{Error, ErrorCode};
    pub use crate::metrics::{MetricsRegistry, OperationStats};
    pub use crate::outcome::{combine, combine_all, Outcome};
    pub use crate::pipeline::{DeferredPipeline, Pipeline, RetryPolicy};
    pub use crate::validation::ValidationErrors;
}
