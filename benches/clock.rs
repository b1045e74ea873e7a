//! Benchmarks for the Clock and MultiClock engines.
//!
//! Run with: `cargo bench --bench clock`

mod common;

use std::time::Instant;

use common::workload::{Workload, WorkloadSpec, run_hit_rate};
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use lfukit::builder::{ClockOptions, MultiClockOptions};
use lfukit::policy::clock::{Clock, ClockEntry};
use lfukit::policy::multi_clock::MultiClock;
use lfukit::store::{HashMapStore, HashMapStoreFactory};

type HashClock = Clock<u64, u64, HashMapStore<u64, ClockEntry<u64>>>;

fn clock(capacity: usize) -> HashClock {
    Clock::with_options(
        &ClockOptions {
            capacity,
            seed: Some(7),
            ..ClockOptions::default()
        },
        HashMapStore::with_capacity(capacity),
    )
}

fn multi_clock(capacity: usize) -> MultiClock<u64, u64, HashMapStoreFactory> {
    MultiClock::with_options(
        &MultiClockOptions {
            capacity,
            seed: Some(7),
            ..MultiClockOptions::default()
        },
        HashMapStoreFactory,
    )
}

// ============================================================================
// Put + val (mixed operations)
// ============================================================================

fn bench_clock_put_val(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_engine");
    let ops_per_iter = 1024u64 * 2;
    group.throughput(Throughput::Elements(ops_per_iter));

    group.bench_function("put_val", |b| {
        b.iter_batched(
            || {
                let mut engine = clock(4096);
                for i in 0..1024u64 {
                    engine.put(i, i, 1);
                }
                engine
            },
            |mut engine| {
                for i in 0..1024u64 {
                    engine.put(std::hint::black_box(i + 10_000), i, 1);
                    let _ = std::hint::black_box(engine.val(&std::hint::black_box(i), 1));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// Eviction churn (every put sweeps)
// ============================================================================

fn bench_clock_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_engine");
    group.throughput(Throughput::Elements(4096));

    group.bench_function("eviction_churn", |b| {
        b.iter_batched(
            || {
                let mut engine = clock(1024);
                for i in 0..1024u64 {
                    engine.put(i, i, 1);
                }
                engine
            },
            |mut engine| {
                for i in 0..4096u64 {
                    engine.put(std::hint::black_box(10_000 + i), i, 1);
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// Val hit (pure read)
// ============================================================================

fn bench_clock_val_hit_ns(c: &mut Criterion) {
    c.bench_function("clock_val_hit_ns", |b| {
        b.iter_custom(|iters| {
            let capacity = 16_384u64;
            let mut engine = clock(capacity as usize * 2);
            for i in 0..capacity {
                engine.put(i, i, 1);
            }
            let start = Instant::now();
            for idx in 0..iters {
                let key = idx % capacity;
                let _ = std::hint::black_box(engine.val(&key, 1));
            }
            start.elapsed()
        })
    });
}

// ============================================================================
// MultiClock growth (filling shards)
// ============================================================================

fn bench_multi_clock_warmup(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_clock_engine");
    let capacity = 16_384usize;
    group.throughput(Throughput::Elements(capacity as u64 / 2));

    group.bench_function("warmup_put", |b| {
        b.iter_batched(
            || multi_clock(capacity),
            |mut engine| {
                for i in 0..(capacity / 2) as u64 {
                    engine.put(std::hint::black_box(i), i, 1);
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// Workload hit rate
// ============================================================================

fn bench_clock_workload_hit_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_workload_hit_rate");
    let operations = 200_000usize;
    group.throughput(Throughput::Elements(operations as u64));

    let specs = [
        ("uniform", Workload::Uniform),
        (
            "hotset_90_10",
            Workload::Hotset {
                hot_fraction: 0.1,
                hot_prob: 0.9,
            },
        ),
        ("scan", Workload::Scan),
        ("zipfian_0.99", Workload::Zipfian { theta: 0.99 }),
    ];

    for (name, workload) in specs {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut total = std::time::Duration::default();
                for _ in 0..iters {
                    let mut engine = multi_clock(4096);
                    let mut generator = WorkloadSpec {
                        universe: 16_384,
                        workload,
                        seed: 42,
                    }
                    .generator();
                    let start = Instant::now();
                    let stats = run_hit_rate(&mut engine, &mut generator, operations);
                    let _ = std::hint::black_box(stats.hit_rate());
                    total += start.elapsed();
                }
                total
            })
        });
    }

    group.finish();
}

criterion_group!(end_to_end, bench_clock_put_val, bench_clock_eviction_churn);
criterion_group!(micro_ops, bench_clock_val_hit_ns, bench_multi_clock_warmup);
criterion_group!(hit_rate, bench_clock_workload_hit_rate);
criterion_main!(end_to_end, micro_ops, hit_rate);
