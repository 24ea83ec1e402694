//! Typed outcomes and their combinators.
//!
//! This module provides:
//! - The `Outcome` success-or-error type
//! - Synchronous and asynchronous combinators
//! - Pairwise and n-ary `combine`

mod async_ops;
mod core;

pub use self::core::{combine, combine_all, Outcome};
pub use async_ops::{combine_all_async, combine_async};
