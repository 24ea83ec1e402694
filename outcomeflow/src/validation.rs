//! Field-level validation error accumulator.

use crate::errors::{Error, ErrorCode};
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collects one message per field; adding a field again replaces its message.
///
/// Fields are kept in name order so the rendered message is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.insert(field.into(), message.into());
        self
    }

    /// Records a message for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    /// Merges `other` into this accumulator; its messages win on conflicts.
    pub fn combine(&mut self, other: Self) -> &mut Self {
        self.errors.extend(other.errors);
        self
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Returns the message for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Iterates `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Builds a `ValidationError` with one metadata entry per field.
    #[must_use]
    pub fn to_error(&self) -> Option<Error> {
        if self.errors.is_empty() {
            return None;
        }
        let message = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(
            Error::create(ErrorCode::ValidationError, message)
                .with_metadata_map(self.errors.iter().map(|(k, v)| (k.clone(), v.clone()))),
        )
    }

    /// `Success(value)` when empty, otherwise the accumulated failure.
    pub fn into_outcome<T>(self, value: T) -> Outcome<T> {
        match self.to_error() {
            None => Outcome::success(value),
            Some(error) => Outcome::failure(error),
        }
    }
}
