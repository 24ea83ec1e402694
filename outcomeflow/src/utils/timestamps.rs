//! Wall-clock timestamps.

use chrono::{DateTime, Utc};

/// A UTC wall-clock timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC time formatted as `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`.
#[must_use]
pub fn iso_timestamp() -> String {
    format_timestamp(&now_utc())
}

/// Formats a timestamp with microsecond precision and an explicit UTC offset.
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
