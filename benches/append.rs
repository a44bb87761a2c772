use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use growth_probe::{probe_capacity, Container, ProbeConfig, ReportedFootprint};

type Words = Vec<u64>;

fn criterion_benchmark(c: &mut Criterion) {
    let config = ProbeConfig::for_container::<Words>();
    let threshold = probe_capacity::<Words, _>(&config, &ReportedFootprint)
        .expect("Vec should reallocate within the default probe range")
        .threshold();

    // Construction happens in the batch setup, so only the push itself is measured.
    c.bench_function("append/at threshold", |b| {
        b.iter_batched(
            || Words::filled(threshold),
            |mut words| {
                words.grow_by_one();
                words
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("append/below threshold", |b| {
        b.iter_batched(
            || Words::filled(threshold - 1),
            |mut words| {
                words.grow_by_one();
                words
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .significance_level(0.02)
        .noise_threshold(0.05)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = criterion_benchmark
);
criterion_main!(benches);
