//! Testing utilities for outcome-returning code.
//!
//! This module provides:
//! - Operations that count, fail on demand, or run slowly
//! - Assertions on outcomes

mod assertions;
mod operations;

pub use assertions::{
    assert_failure, assert_failure_code, assert_failure_message, assert_success,
    assert_success_value,
};
pub use operations::{CountingOperation, FlakyOperation, SlowOperation};
