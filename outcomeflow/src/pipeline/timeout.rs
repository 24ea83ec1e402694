//! Runs a unit of work on a background executor and stops waiting after a deadline.
//!
//! The work is never cancelled. When the deadline wins, the background unit
//! keeps running to completion and its outcome is dropped.

use crate::errors::{Error, ErrorCode};
use crate::outcome::Outcome;
use std::sync::mpsc;
use std::time::Duration;
use tracing::warn;

/// Runs `work` on a dedicated thread and blocks for at most `timeout`.
pub(crate) fn run_blocking_with_timeout<T, F>(timeout: Duration, work: F) -> Outcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> Outcome<T> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    let spawned = std::thread::Builder::new()
        .name("outcomeflow-timeout".to_string())
        .spawn(move || {
            // The receiver may already be gone if the caller timed out.
            let _ = tx.send(work());
        });

    if let Err(e) = spawned {
        return Outcome::failure(
            Error::create(ErrorCode::Exception, format!("Failed to spawn worker: {e}")),
        );
    }

    match rx.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = duration_ms(timeout), "Operation timed out");
            Outcome::failure(Error::timeout())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => panicked(),
    }
}

/// Runs `work` on the blocking pool and awaits it for at most `timeout`.
pub(crate) async fn run_async_with_timeout<T, F>(timeout: Option<Duration>, work: F) -> Outcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> Outcome<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(timeout_ms = duration_ms(limit), "Operation timed out");
                return Outcome::failure(Error::timeout());
            }
        },
        None => handle.await,
    };

    joined.unwrap_or_else(|_| panicked())
}

fn panicked<T>() -> Outcome<T> {
    Outcome::failure_with(ErrorCode::Exception, "Operation panicked")
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
