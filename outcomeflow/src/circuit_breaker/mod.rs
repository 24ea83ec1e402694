//! Circuit breaker for repeated calls to an unreliable operation.
//!
//! The breaker has three states:
//! - Closed: calls pass through
//! - Open: calls are rejected with `CircuitBreakerOpen` until the reset timeout elapses
//! - HalfOpen: a bounded number of trial calls decide between Closed and Open

mod breaker;
#[cfg(test)]
mod breaker_tests;
mod settings;
mod state;

pub use breaker::{BreakerSnapshot, CircuitBreaker};
pub use settings::{CircuitBreakerSettings, SettingsError};
pub use state::CircuitState;
