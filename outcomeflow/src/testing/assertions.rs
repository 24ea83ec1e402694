//! Assertions for outcomes.

use crate::errors::ErrorCode;
use crate::outcome::Outcome;
use std::fmt::Debug;

/// Asserts that the outcome is a success.
pub fn assert_success<T: Debug>(outcome: &Outcome<T>) {
    assert!(
        outcome.is_success(),
        "Expected success, got failure: {:?}",
        outcome.error()
    );
}

/// Asserts that the outcome is a success holding `expected`.
pub fn assert_success_value<T: Debug + PartialEq>(outcome: &Outcome<T>, expected: &T) {
    assert_success(outcome);
    assert_eq!(
        outcome.value(),
        Some(expected),
        "Expected value {expected:?}, got {:?}",
        outcome.value()
    );
}

/// Asserts that the outcome is a failure.
pub fn assert_failure<T: Debug>(outcome: &Outcome<T>) {
    assert!(
        outcome.is_failure(),
        "Expected failure, got success: {:?}",
        outcome.value()
    );
}

/// Asserts that the outcome failed with the given code.
pub fn assert_failure_code<T: Debug>(outcome: &Outcome<T>, expected: ErrorCode) {
    assert_failure(outcome);
    let actual = outcome.error().map(|e| e.code);
    assert_eq!(
        actual,
        Some(expected),
        "Expected error code {expected}, got {actual:?}"
    );
}

/// Asserts that the outcome failed with a message containing `fragment`.
pub fn assert_failure_message<T: Debug>(outcome: &Outcome<T>, fragment: &str) {
    assert_failure(outcome);
    let message = outcome.error().map(|e| e.message.as_str()).unwrap_or_default();
    assert!(
        message.contains(fragment),
        "Expected error message containing '{fragment}', got '{message}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_success() {
        assert_success(&Outcome::success(1));
        assert_success_value(&Outcome::success("a"), &"a");
    }

    #[test]
    fn test_assert_failure_code() {
        let out: Outcome<()> = Outcome::failure_with(ErrorCode::NotFound, "missing user");
        assert_failure(&out);
        assert_failure_code(&out, ErrorCode::NotFound);
        assert_failure_message(&out, "missing");
    }

    #[test]
    #[should_panic(expected = "Expected failure")]
    fn test_assert_failure_panics_on_success() {
        assert_failure(&Outcome::success(1));
    }

    #[test]
    #[should_panic(expected = "Expected error code")]
    fn test_assert_failure_code_panics_on_other_code() {
        let out: Outcome<()> = Outcome::failure_with(ErrorCode::Timeout, "slow");
        assert_failure_code(&out, ErrorCode::NotFound);
    }
}
