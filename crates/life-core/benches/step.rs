//! Generation throughput benchmarks using criterion.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use life_core::{Engine, EngineConfig};
use rand::{Rng, SeedableRng, rngs::SmallRng};

const SIDE: usize = 256;

fn seeded_engine(side: usize, workers: usize) -> Engine {
    let mut rng = SmallRng::seed_from_u64(0xB0A7);
    let mut engine = Engine::new(EngineConfig::new(side, side).with_workers(workers))
        .expect("engine config is valid");
    engine.randomize(std::iter::repeat_with(|| rng.random::<bool>()));
    engine
}

fn step_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_generation");
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("random_256", workers),
            &workers,
            |b, &workers| {
                let mut engine = seeded_engine(SIDE, workers);
                b.iter(|| {
                    engine.step_generation().expect("no worker panics");
                    black_box(engine.generation());
                });
            },
        );
    }

    group.finish();
}

fn maintenance_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("maintenance");
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));

    group.bench_function("recompute_all", |b| {
        let mut engine = seeded_engine(SIDE, 1);
        b.iter(|| {
            engine.recompute_all();
            black_box(engine.neighbor_count(0, 0).ok());
        });
    });

    group.bench_function("randomize", |b| {
        let mut engine = seeded_engine(SIDE, 1);
        let mut rng = SmallRng::seed_from_u64(7);
        b.iter(|| {
            engine.randomize(std::iter::repeat_with(|| rng.random::<bool>()));
            black_box(engine.population());
        });
    });

    group.finish();
}

criterion_group!(benches, step_benchmarks, maintenance_benchmarks);
criterion_main!(benches);
