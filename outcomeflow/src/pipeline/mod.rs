//! Pipeline building and execution.
//!
//! This module provides:
//! - `Pipeline`, an eager chain of outcome combinators
//! - `DeferredPipeline`, a chain re-run on every retry attempt
//! - Timeout and fixed-delay retry settings applied by `build`

mod builder;
mod deferred;
mod retry;
mod timeout;

pub use builder::{Pipeline, PipelineSettings};
pub use deferred::DeferredPipeline;
pub use retry::{RetryDecision, RetryPolicy, RetryState};
