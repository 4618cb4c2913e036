//! Benchmark for layer construction and chunk planning.
//!
//! Run with: cargo bench --package wildmere_procedural --bench planner_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wildmere_procedural::{ActiveGroups, ClimateLayer, ReservationMap, WorldConfig, WorldContext, WorldSeed};
use wildmere_shared::ChunkKey;

fn ready_context() -> WorldContext {
    let mut ctx = WorldContext::new(WorldConfig::default()).expect("default config is valid");
    ctx.build_all().expect("layers build");
    ctx
}

fn benchmark_climate_build(c: &mut Criterion) {
    let config = WorldConfig::default();
    let mut group = c.benchmark_group("layers");
    group.sample_size(10);

    group.bench_function("climate_513x513", |b| {
        b.iter(|| {
            black_box(
                ClimateLayer::build(&config.climate, config.half_extent, WorldSeed::new(42))
                    .expect("climate builds"),
            )
        });
    });

    group.finish();
}

fn benchmark_object_chunk(c: &mut Criterion) {
    let ctx = ready_context();
    let planner = ctx.object_planner().expect("biomes ready");
    let biomes = ctx.biomes().expect("biomes ready");
    let reservations = ReservationMap::new();

    c.bench_function("object_plan_chunk", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 16;
            black_box(planner.plan_chunk(ChunkKey::pack(i % 4 - 2, i / 4 - 2), biomes, &reservations))
        });
    });
}

fn benchmark_camp_chunk(c: &mut Criterion) {
    let ctx = ready_context();
    let planner = ctx.camp_planner().expect("biomes ready");
    let biomes = ctx.biomes().expect("biomes ready");

    c.bench_function("camp_plan_chunk", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 16;
            black_box(planner.plan(ChunkKey::pack(i % 4 - 2, i / 4 - 2), biomes))
        });
    });
}

fn benchmark_creature_chunk(c: &mut Criterion) {
    let ctx = ready_context();
    let planner = ctx.creature_planner().expect("biomes ready");
    let biomes = ctx.biomes().expect("biomes ready");
    let reservations = ReservationMap::new();

    c.bench_function("creature_plan_chunk", |b| {
        b.iter(|| {
            let mut active = ActiveGroups::new();
            black_box(active.activate(&planner, ChunkKey::pack(0, 0), biomes, &reservations).len())
        });
    });
}

criterion_group!(
    benches,
    benchmark_climate_build,
    benchmark_object_chunk,
    benchmark_camp_chunk,
    benchmark_creature_chunk
);
criterion_main!(benches);
