//! Logging setup.
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! application installs a subscriber. [`init_tracing`] installs a compact
//! formatter filtered by `RUST_LOG`, falling back to `info`.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();
static INIT_TEST: Once = Once::new();

/// Installs the global subscriber once; later calls are no-ops.
///
/// Returns quietly if another subscriber was already installed.
pub fn init_tracing() {
    init_tracing_with_filter(DEFAULT_FILTER);
}

/// Like [`init_tracing`], with a custom fallback filter directive.
pub fn init_tracing_with_filter(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init();
    });
}

/// Installs a subscriber that writes through the test harness.
///
/// Independent of [`init_tracing`]; whichever installs first owns the global
/// subscriber and the other becomes a no-op.
pub fn init_test_tracing() {
    INIT_TEST.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        init_tracing_with_filter("not a [valid filter");
        tracing::info!(target: "outcomeflow", "still logging");
    }

    #[test]
    fn test_init_test_tracing_runs_after_init() {
        init_tracing();
        init_test_tracing();
        init_test_tracing();
        tracing::debug!(target: "outcomeflow", "test writer");
    }
}
