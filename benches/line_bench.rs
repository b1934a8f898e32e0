//! Performance benchmarks for the line simulator.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench line_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use linesim::scheduler::Scheduler;
use linesim::store::Store;
use linesim::sweep::{capacity_sweep, SweepRunner};
use linesim::{Line, LineConfig, LineConfigBuilder, Wake};

// ============================================================================
// Configurations
// ============================================================================

fn reference(horizon: f64) -> LineConfig {
    LineConfigBuilder::new().horizon(horizon).build().unwrap()
}

/// Pack slower than arrivals: every buffer saturates and the generator suspends.
fn congested(horizon: f64) -> LineConfig {
    LineConfigBuilder::new()
        .horizon(horizon)
        .buffer_capacity(2)
        .stage_duration(linesim::StageKind::Pack, 25.0)
        .build()
        .unwrap()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_reference_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_line");

    for horizon in [1_000.0, 10_000.0, 100_000.0].iter() {
        let config = reference(*horizon);
        group.throughput(Throughput::Elements((*horizon / 10.0) as u64));
        group.bench_with_input(
            BenchmarkId::new("horizon", *horizon as u64),
            &config,
            |b, config| {
                b.iter(|| black_box(Line::new(config).unwrap().run().unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_congested_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("congested_line");

    for horizon in [10_000.0, 100_000.0].iter() {
        let config = congested(*horizon);
        group.bench_with_input(
            BenchmarkId::new("horizon", *horizon as u64),
            &config,
            |b, config| {
                b.iter(|| black_box(linesim::run(config).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_capacity_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("capacity_sweep");
    group.sample_size(10);

    let configs = capacity_sweep(&congested(20_000.0), &[1, 2, 3, 5, 8, 13, 21, 34]);

    for threads in [1, 4].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            let runner = SweepRunner::new().with_threads(threads);
            b.iter(|| black_box(runner.run(&configs)));
        });
    }

    group.finish();
}

fn bench_event_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue");

    for num_events in [1_000u64, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*num_events));
        group.bench_with_input(
            BenchmarkId::new("schedule_and_drain", num_events),
            num_events,
            |b, &num_events| {
                b.iter(|| {
                    let mut scheduler = Scheduler::new();
                    for i in 0..num_events {
                        scheduler.schedule((i * 7919) % 10_000, (i % 6) as u32, Wake::Timeout);
                    }
                    let executed: Result<u64, ()> =
                        scheduler.run_until(10_000, |_, event| {
                            black_box(event);
                            Ok(())
                        });
                    black_box(executed)
                });
            },
        );
    }

    group.finish();
}

fn bench_store_cycle(c: &mut Criterion) {
    c.bench_function("store_put_get_cycle", |b| {
        b.iter(|| {
            let mut store = Store::new(0, "bench_queue", 5);
            for item in 0..1_000u64 {
                black_box(store.put(item, 0, item));
                black_box(store.get(item, 1));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_reference_line,
    bench_congested_line,
    bench_capacity_sweep,
    bench_event_queue,
    bench_store_cycle,
);

criterion_main!(benches);
