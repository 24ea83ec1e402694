#[cfg(test)]
mod tests {
    use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerSettings, CircuitState};
    use crate::errors::ErrorCode;
    use crate::metrics::MetricsRegistry;
    use crate::observability::init_test_tracing;
    use crate::outcome::Outcome;
    use crate::testing::{assert_failure_code, assert_success_value, CountingOperation, FlakyOperation};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    const RESET: Duration = Duration::from_millis(50);

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "payments",
            CircuitBreakerSettings::new()
                .with_failure_threshold(3)
                .with_reset_timeout(RESET)
                .with_half_open_success_threshold(2),
        )
    }

    fn trip(breaker: &CircuitBreaker) {
        let failing: CountingOperation<i32> =
            CountingOperation::failing(ErrorCode::NetworkError, "connection refused");
        for _ in 0..breaker.settings().failure_threshold {
            let _ = breaker.execute(|| failing.call());
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    fn wait_for_reset() {
        std::thread::sleep(RESET + Duration::from_millis(20));
    }

    #[test]
    fn test_new_breaker_is_closed() {
        let breaker = breaker();
        assert_eq!(breaker.name(), "payments");
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.last_failure_time().is_none());
    }

    #[test]
    fn test_success_passes_through() {
        let breaker = breaker();
        let out = breaker.execute(|| Outcome::success("paid"));
        assert_success_value(&out, &"paid");
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_failure_is_returned_unchanged() {
        let breaker = breaker();
        let out: Outcome<()> = breaker.execute(|| Outcome::failure_with(ErrorCode::NotFound, "no invoice"));

        assert_failure_code(&out, ErrorCode::NotFound);
        assert_eq!(out.error().unwrap().message, "no invoice");
        assert_eq!(breaker.failure_count(), 1);
        assert!(breaker.last_failure_time().is_some());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_threshold_opens_and_rejects_without_calling() {
        let breaker = breaker();
        trip(&breaker);
        assert_eq!(breaker.failure_count(), 3);

        let op = CountingOperation::succeeding(1);
        let out = breaker.execute(|| op.call());

        assert_failure_code(&out, ErrorCode::CircuitBreakerOpen);
        assert_eq!(
            out.error().unwrap().message,
            "Circuit breaker is open for operation: payments"
        );
        assert_eq!(op.call_count(), 0);
    }

    #[test]
    fn test_success_in_closed_state_keeps_failure_count() {
        let breaker = breaker();
        let _: Outcome<()> = breaker.execute(|| Outcome::failure_with(ErrorCode::Timeout, "slow"));
        let _ = breaker.execute(|| Outcome::success(()));
        assert_eq!(breaker.failure_count(), 1);
    }

    #[test]
    fn test_half_open_after_reset_timeout_then_closes() {
        let breaker = breaker();
        trip(&breaker);
        wait_for_reset();

        let op = CountingOperation::succeeding(7);
        assert_success_value(&breaker.execute(|| op.call()), &7);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.half_open_success_count(), 1);

        assert_success_value(&breaker.execute(|| op.call()), &7);
        assert_eq!(op.call_count(), 2);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.half_open_success_count(), 0);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let breaker = breaker();
        trip(&breaker);
        wait_for_reset();

        let out: Outcome<i32> = breaker.execute(|| Outcome::failure_with(ErrorCode::NetworkError, "still down"));
        assert_failure_code(&out, ErrorCode::NetworkError);
        assert_eq!(breaker.state(), CircuitState::Open);

        let op = CountingOperation::succeeding(1);
        assert_failure_code(&breaker.execute(|| op.call()), ErrorCode::CircuitBreakerOpen);
        assert_eq!(op.call_count(), 0);
    }

    #[test]
    fn test_flaky_dependency_recovers() {
        let breaker = breaker();
        let op = FlakyOperation::new(3, "recovered");

        for _ in 0..3 {
            assert!(breaker.execute(|| op.call()).is_failure());
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_failure_code(&breaker.execute(|| op.call()), ErrorCode::CircuitBreakerOpen);
        assert_eq!(op.call_count(), 3);

        wait_for_reset();
        assert!(breaker.execute(|| op.call()).is_success());
        assert!(breaker.execute(|| op.call()).is_success());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_panic_is_caught_and_counted() {
        let breaker = breaker();
        let out: Outcome<i32> = breaker.execute(|| panic!("boom"));

        assert_failure_code(&out, ErrorCode::CircuitBreakerError);
        let message = &out.error().unwrap().message;
        assert!(message.contains("payments"));
        assert!(message.contains("boom"));
        assert_eq!(breaker.failure_count(), 1);
    }

    #[test]
    fn test_half_open_trials_are_bounded_across_threads() {
        let breaker = Arc::new(breaker());
        trip(&breaker);
        wait_for_reset();

        let running = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(6));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                let running = Arc::clone(&running);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    breaker.execute(|| {
                        running.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(100));
                        Outcome::success(())
                    })
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let rejected = outcomes
            .iter()
            .filter(|o| o.error().is_some_and(|e| e.code == ErrorCode::CircuitBreakerOpen))
            .count();

        assert_eq!(running.load(Ordering::SeqCst), 2);
        assert_eq!(rejected, 4);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_reset_closes_open_breaker() {
        let breaker = breaker();
        trip(&breaker);

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.last_failure_time().is_none());
        assert!(breaker.execute(|| Outcome::success(1)).is_success());
    }

    #[test]
    fn test_snapshot_serializes() {
        let breaker = breaker();
        trip(&breaker);

        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.name, "payments");
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.failure_count, 3);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["failure_count"], 3);
        assert!(json["last_failure_time"].is_string());
    }

    #[test]
    fn test_try_new_rejects_zero_threshold() {
        let err = CircuitBreaker::try_new(
            "bad",
            CircuitBreakerSettings::new().with_failure_threshold(0),
        )
        .unwrap_err();
        assert_eq!(err.field, "failure_threshold");

        assert!(CircuitBreaker::try_new("good", CircuitBreakerSettings::default()).is_ok());
    }

    #[test]
    fn test_metrics_are_recorded() {
        let registry = Arc::new(MetricsRegistry::new());
        let breaker = breaker().with_metrics(Arc::clone(&registry));

        let _ = breaker.execute(|| Outcome::success(1));
        trip(&breaker);
        let _ = breaker.execute(|| Outcome::success(1));

        let stats = registry.snapshot("payments").unwrap();
        assert_eq!(stats.calls, 4);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.rejections, 1);
    }

    #[tokio::test]
    async fn test_execute_async_success_and_failure() {
        let breaker = breaker();

        let out = breaker
            .execute_async(|| async {
                tokio::task::yield_now().await;
                Outcome::success(5)
            })
            .await;
        assert_success_value(&out, &5);

        for _ in 0..3 {
            let out: Outcome<i32> = breaker
                .execute_async(|| async { Outcome::failure_with(ErrorCode::NetworkError, "down") })
                .await;
            assert_failure_code(&out, ErrorCode::NetworkError);
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let calls = AtomicUsize::new(0);
        let out = breaker
            .execute_async(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Outcome::success(1)
            })
            .await;
        assert_failure_code(&out, ErrorCode::CircuitBreakerOpen);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_async_catches_panic() {
        let breaker = breaker();
        let explode = true;
        let out: Outcome<i32> = breaker
            .execute_async(|| async move {
                if explode {
                    panic!("async boom");
                }
                Outcome::success(1)
            })
            .await;

        assert_failure_code(&out, ErrorCode::CircuitBreakerError);
        assert!(out.error().unwrap().message.contains("async boom"));
        assert_eq!(breaker.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_async_recovers_after_reset_timeout() {
        let breaker = breaker();
        trip(&breaker);
        tokio::time::sleep(RESET + Duration::from_millis(20)).await;

        for _ in 0..2 {
            let out = breaker.execute_async(|| async { Outcome::success("ok") }).await;
            assert!(out.is_success());
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_execute_from_sync_driven_future() {
        let breaker = breaker();
        let out = tokio_test::block_on(breaker.execute_async(|| async { Outcome::success(9) }));
        assert_eq!(out, Outcome::success(9));
    }

    #[tokio::test]
    async fn test_cancelled_trials_return_their_permits() {
        init_test_tracing();
        let breaker = breaker();
        trip(&breaker);
        tokio::time::sleep(RESET + Duration::from_millis(20)).await;

        for _ in 0..2 {
            let abandoned = tokio::time::timeout(
                Duration::from_millis(5),
                breaker.execute_async(|| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Outcome::success(0)
                }),
            )
            .await;
            assert!(abandoned.is_err());
        }
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let op = CountingOperation::succeeding(1);
        assert_success_value(&breaker.execute(|| op.call()), &1);
        assert_eq!(op.call_count(), 1);
        assert_success_value(&breaker.execute(|| op.call()), &1);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_zero_success_threshold_closes_on_first_trial() {
        init_test_tracing();
        let breaker = CircuitBreaker::new(
            "ledger",
            CircuitBreakerSettings::new()
                .with_failure_threshold(3)
                .with_reset_timeout(RESET)
                .with_half_open_success_threshold(0),
        );
        trip(&breaker);
        wait_for_reset();

        let op = CountingOperation::succeeding("posted");
        assert_success_value(&breaker.execute(|| op.call()), &"posted");
        assert_eq!(op.call_count(), 1);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
