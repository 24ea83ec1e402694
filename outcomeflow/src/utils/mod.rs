//! Time helpers shared by the pipeline and the circuit breaker.

pub mod durations;
pub mod timestamps;

pub use timestamps::{iso_timestamp, now_utc, Timestamp};
