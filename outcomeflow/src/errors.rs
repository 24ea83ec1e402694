//! Error types carried by failed outcomes.
//!
//! An [`Error`] pairs a closed [`ErrorCode`] with a human readable message and
//! optional structured metadata. Errors are immutable apart from metadata
//! attachment, which always returns a new value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error as ThisError;

/// Closed classification of failure causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No error.
    #[default]
    None,
    /// Input failed a validation rule.
    ValidationError,
    /// A requested entity does not exist.
    NotFound,
    /// The operation is not valid in the current state.
    InvalidOperation,
    /// Network I/O failed.
    NetworkError,
    /// A database call failed.
    DatabaseError,
    /// Encoding a value failed.
    SerializationError,
    /// Decoding a value failed.
    DeserializationError,
    /// Encryption failed.
    EncryptionError,
    /// Decryption failed.
    DecryptionError,
    /// Compression failed.
    CompressionError,
    /// Decompression failed.
    DecompressionError,
    /// A circuit breaker rejected the call.
    CircuitBreakerOpen,
    /// The operation behind a circuit breaker blew up.
    CircuitBreakerError,
    /// A timeout reported by the operation itself.
    TimeoutError,
    /// Cause unknown.
    Unknown,
    /// A raised error was translated into an outcome.
    Exception,
    /// A pipeline gave up waiting.
    Timeout,
}

impl ErrorCode {
    /// Returns the code's canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::InvalidOperation => "InvalidOperation",
            Self::NetworkError => "NetworkError",
            Self::DatabaseError => "DatabaseError",
            Self::SerializationError => "SerializationError",
            Self::DeserializationError => "DeserializationError",
            Self::EncryptionError => "EncryptionError",
            Self::DecryptionError => "DecryptionError",
            Self::CompressionError => "CompressionError",
            Self::DecompressionError => "DecompressionError",
            Self::CircuitBreakerOpen => "CircuitBreakerOpen",
            Self::CircuitBreakerError => "CircuitBreakerError",
            Self::TimeoutError => "TimeoutError",
            Self::Unknown => "Unknown",
            Self::Exception => "Exception",
            Self::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error half of an [`Outcome`](crate::outcome::Outcome).
///
/// The display form is `"<code>: <message>"`. Metadata is available for
/// structured inspection but never rendered by `Display`.
#[derive(Debug, Clone, PartialEq, ThisError, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Error {
    /// Failure classification.
    pub code: ErrorCode,
    /// Human readable description.
    pub message: String,
    /// Structured context; keys are unique and the last write wins.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Error {
    /// Creates an error with no metadata.
    #[must_use]
    pub fn create(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::create(ErrorCode::ValidationError, message)
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::create(ErrorCode::NotFound, message)
    }

    /// Creates an invalid-operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::create(ErrorCode::InvalidOperation, message)
    }

    /// Creates the error a pipeline reports when it stops waiting.
    #[must_use]
    pub fn timeout() -> Self {
        Self::create(ErrorCode::Timeout, "Operation timed out")
    }

    /// Wraps any displayable error as an `Exception`.
    #[must_use]
    pub fn exception(err: &dyn std::error::Error) -> Self {
        Self::create(ErrorCode::Exception, err.to_string())
    }

    /// Returns a copy of this error with `key` set to `value`.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns a copy of this error with every entry of `metadata` merged in.
    #[must_use]
    pub fn with_metadata_map<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Looks up a metadata entry.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Returns true if the error carries the given code.
    #[must_use]
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code.as_str()));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if !self.metadata.is_empty() {
            let metadata: serde_json::Map<String, serde_json::Value> = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            map.insert("metadata".to_string(), serde_json::Value::Object(metadata));
        }
        map
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::NotFound,
            std::io::ErrorKind::TimedOut => ErrorCode::TimeoutError,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::AddrInUse
            | std::io::ErrorKind::AddrNotAvailable
            | std::io::ErrorKind::BrokenPipe => ErrorCode::NetworkError,
            _ => ErrorCode::Exception,
        };
        Self::create(code, err.to_string()).with_metadata("io_kind", format!("{:?}", err.kind()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let code = if err.is_io() {
            ErrorCode::SerializationError
        } else {
            // Syntax, EOF and data errors all come from reading input.
            ErrorCode::DeserializationError
        };
        Self::create(code, err.to_string())
            .with_metadata("line", err.line())
            .with_metadata("column", err.column())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        Self::create(ErrorCode::Exception, format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_is_code_and_message() {
        let err = Error::create(ErrorCode::InvalidOperation, "x");
        assert_eq!(err.to_string(), "InvalidOperation: x");
    }

    #[test]
    fn test_with_metadata_merges() {
        let err = Error::create(ErrorCode::InvalidOperation, "x").with_metadata("k", "v");

        assert_eq!(err.metadata_value("k"), Some(&serde_json::json!("v")));
        assert_eq!(err.to_string(), "InvalidOperation: x");
    }

    #[test]
    fn test_with_metadata_last_write_wins() {
        let err = Error::not_found("user")
            .with_metadata("id", 1)
            .with_metadata("id", 2);

        assert_eq!(err.metadata.len(), 1);
        assert_eq!(err.metadata_value("id"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_with_metadata_map() {
        let err = Error::validation("bad input")
            .with_metadata("a", 1)
            .with_metadata_map([("a", "one"), ("b", "two")]);

        assert_eq!(err.metadata_value("a"), Some(&serde_json::json!("one")));
        assert_eq!(err.metadata_value("b"), Some(&serde_json::json!("two")));
    }

    #[test]
    fn test_timeout_error() {
        let err = Error::timeout();
        assert!(err.is(ErrorCode::Timeout));
        assert_eq!(err.to_string(), "Timeout: Operation timed out");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err = Error::from(io);

        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "missing.txt");
        assert_eq!(err.metadata_value("io_kind"), Some(&serde_json::json!("NotFound")));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(Error::from(refused).code, ErrorCode::NetworkError);
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::from(parse);

        assert_eq!(err.code, ErrorCode::DeserializationError);
        assert!(err.metadata_value("line").is_some());
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let source = anyhow::anyhow!("disk full").context("writing snapshot");
        let err = Error::from(source);

        assert_eq!(err.code, ErrorCode::Exception);
        assert_eq!(err.message, "writing snapshot: disk full");
    }

    #[test]
    fn test_to_dict() {
        let err = Error::invalid_operation("nope").with_metadata("attempt", 3);
        let dict = err.to_dict();

        assert_eq!(dict.get("code").unwrap(), "InvalidOperation");
        assert_eq!(dict.get("message").unwrap(), "nope");
        assert_eq!(dict.get("metadata").unwrap()["attempt"], 3);
    }

    #[test]
    fn test_error_serialization() {
        let err = Error::not_found("order 7").with_metadata("order_id", 7);

        let json = serde_json::to_string(&err).unwrap();
        let back: Error = serde_json::from_str(&json).unwrap();

        assert_eq!(back, err);
    }

    #[test]
    fn test_error_code_default_is_none() {
        assert_eq!(ErrorCode::default(), ErrorCode::None);
        assert_eq!(ErrorCode::CircuitBreakerOpen.to_string(), "CircuitBreakerOpen");
    }
}
