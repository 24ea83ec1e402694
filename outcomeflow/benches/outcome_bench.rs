//! Benchmarks for outcome combinators and the circuit breaker gate.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use outcomeflow::prelude::*;

fn combinator_benchmark(c: &mut Criterion) {
    c.bench_function("outcome_chain", |b| {
        b.iter(|| {
            Outcome::success(black_box(21))
                .map(|n| n * 2)
                .bind(|n| Outcome::success(n + 1))
                .validate(|n| *n > 0, ErrorCode::ValidationError, "must be positive")
                .value_or(0)
        })
    });

    c.bench_function("pipeline_end", |b| {
        b.iter(|| {
            Pipeline::start(black_box(21))
                .map(|n| n * 2)
                .then(|n| Outcome::success(n - 1))
                .catch(|_| Outcome::success(0))
                .end()
        })
    });

    c.bench_function("combine_all_100", |b| {
        let outcomes: Vec<Outcome<u32>> = (0..100).map(Outcome::success).collect();
        b.iter(|| combine_all(black_box(outcomes.clone())))
    });
}

fn breaker_benchmark(c: &mut Criterion) {
    let closed = CircuitBreaker::new("closed", CircuitBreakerSettings::default());
    c.bench_function("breaker_closed_execute", |b| {
        b.iter(|| closed.execute(|| Outcome::success(black_box(1))))
    });

    let open = CircuitBreaker::new(
        "open",
        CircuitBreakerSettings::default().with_failure_threshold(1),
    );
    let _: Outcome<()> = open.execute(|| Outcome::failure_with(ErrorCode::NetworkError, "down"));
    c.bench_function("breaker_open_reject", |b| {
        b.iter(|| open.execute(|| Outcome::success(black_box(1))))
    });
}

criterion_group!(benches, combinator_benchmark, breaker_benchmark);
criterion_main!(benches);
