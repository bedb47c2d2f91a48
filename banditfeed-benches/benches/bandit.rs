//! Bandit simulation benchmarks.
//!
//! Measures both reward simulators end to end: the biased single-digit
//! policy with stride-2 subsampling and the logged policy over composed
//! scenes.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::expect_used,
    reason = "benchmark setup is infallible for valid constants"
)]

use criterion::{Criterion, criterion_group, criterion_main};

use banditfeed_benches::source::{SyntheticConfig, synthetic_pool};
use banditfeed_core::{random_policy, simulate_logged_bandit};
use rand::{SeedableRng, rngs::SmallRng};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 42;

/// Size of the synthetic source pool.
const EXAMPLE_COUNT: usize = 10_000;

/// Interactions simulated per iteration.
const BATCH_SIZE: usize = 64;

fn bandit_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("bandit_simulation");
    group.sample_size(20);

    let pool = synthetic_pool(&SyntheticConfig {
        example_count: EXAMPLE_COUNT,
        seed: SEED,
    })
    .expect("synthetic pool generation must succeed");

    group.bench_function("random_policy", |b| {
        let mut drawing = pool.clone();
        let mut rng = SmallRng::seed_from_u64(SEED);
        b.iter(|| {
            random_policy(&mut drawing, BATCH_SIZE, &mut rng)
                .expect("simulation must succeed")
        });
    });

    group.bench_function("simulate_logged_bandit", |b| {
        let mut drawing = pool.clone();
        let mut rng = SmallRng::seed_from_u64(SEED);
        b.iter(|| {
            simulate_logged_bandit(&mut drawing, BATCH_SIZE, &mut rng)
                .expect("simulation must succeed")
        });
    });

    group.finish();
}

criterion_group!(benches, bandit_simulation);
criterion_main!(benches);
