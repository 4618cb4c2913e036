//! # Worldgen Determinism Tests
//!
//! End-to-end checks through the public API: a validated config goes into a
//! `WorldContext`, layers are built, and planners run chunk by chunk.
//!
//! Same seed, same world. Different load orders, same world.

use std::collections::HashSet;

use wildmere_procedural::config::{BiomeChanceDef, BiomeDef, ClimateZoneDef};
use wildmere_procedural::{
    check_coverage, ClimateConfig, PlacementMode, PlacementRuleDef, ReservationMap, WorldConfig,
    WorldContext,
};
use wildmere_shared::{Cell, ChunkKey};

const ROCK: u32 = 7;

/// A single all-plains zone with one Rock rule.
fn rock_world() -> WorldConfig {
    WorldConfig {
        seed: 12345,
        half_extent: [96, 96],
        chunk_size: 64,
        climate: ClimateConfig {
            noise_strength: 0.0,
            min_region_size: 0,
            zones: vec![ClimateZoneDef {
                name: "temperate".into(),
                start_percent: 0.0,
                end_percent: 100.0,
                default_biome: "plains".into(),
                biome_chances: vec![BiomeChanceDef {
                    biome: "plains".into(),
                    min: 0.0,
                    max: 1.0,
                }],
            }],
            ..ClimateConfig::default()
        },
        biomes: vec![BiomeDef {
            name: "plains".into(),
            color: [120, 200, 80],
        }],
        placement: vec![PlacementRuleDef {
            biome: "plains".into(),
            kind: ROCK,
            target_per_chunk: 10,
            mode: PlacementMode::Uniform,
            min_distance_same_type: 4.0,
            ..PlacementRuleDef::default()
        }],
        ..WorldConfig::default()
    }
}

fn ready(config: WorldConfig) -> WorldContext {
    let mut ctx = WorldContext::new(config).expect("config is valid");
    ctx.build_all().expect("layers build");
    ctx
}

/// Test: the reference Rock scenario is bounded, disjoint and reproducible.
#[test]
fn test_rock_scenario_reproducible() {
    let key = ChunkKey::pack(0, 0);

    let first = {
        let ctx = ready(rock_world());
        let planner = ctx.object_planner().unwrap();
        planner.plan_chunk(key, ctx.biomes().unwrap(), ctx.reservations())
    };
    let second = {
        let ctx = ready(rock_world());
        let planner = ctx.object_planner().unwrap();
        planner.plan_chunk(key, ctx.biomes().unwrap(), ctx.reservations())
    };

    println!("Rock scenario placed {} instances", first.len());
    assert!(!first.is_empty(), "An all-plains chunk should hold rocks");
    assert!(first.len() <= 10, "Placed {} rocks, target is 10", first.len());
    assert_eq!(first, second, "Same seed must yield identical plans");

    let mut cells = HashSet::new();
    for object in &first {
        assert_eq!(object.kind.0, ROCK);
        assert!((0..64).contains(&object.cell.x) && (0..64).contains(&object.cell.y));
        for cell in object.rect().cells() {
            assert!(cells.insert(cell), "Footprint cell {cell:?} shared");
        }
    }
}

/// Test: a different seed yields a different plan.
#[test]
fn test_seed_changes_plan() {
    let key = ChunkKey::pack(0, 0);
    let plan = |seed| {
        let ctx = ready(WorldConfig { seed, ..rock_world() });
        let planner = ctx.object_planner().unwrap();
        planner.plan_chunk(key, ctx.biomes().unwrap(), ctx.reservations())
    };
    assert_ne!(plan(1), plan(2));
}

/// Test: every kind keeps its same-type spacing across a whole chunk grid.
#[test]
fn test_same_type_spacing_holds() {
    let ctx = ready(rock_world());
    let planner = ctx.object_planner().unwrap();

    for cy in -1..1 {
        for cx in -1..1 {
            let objects = planner.plan_chunk(ChunkKey::pack(cx, cy), ctx.biomes().unwrap(), ctx.reservations());
            for (i, a) in objects.iter().enumerate() {
                for b in &objects[i + 1..] {
                    let d = (a.cell.distance_squared(b.cell) as f64).sqrt();
                    assert!(d >= 4.0, "Rocks {:?} and {:?} are {:.2} apart", a.cell, b.cell, d);
                }
            }
        }
    }
}

/// Test: reserved ground stays empty.
#[test]
fn test_reserved_ground_is_skipped() {
    let ctx = ready(rock_world());
    let planner = ctx.object_planner().unwrap();
    let mut reservations = ReservationMap::new();
    let center = Cell::new(32, 32);
    reservations.reserve_circle(center, 20, wildmere_procedural::ReservationMask::NATURE);

    let objects = planner.plan_chunk(ChunkKey::pack(0, 0), ctx.biomes().unwrap(), &reservations);
    for object in &objects {
        for cell in object.rect().cells() {
            assert!(
                !reservations.is_reserved(cell, wildmere_procedural::ReservationMask::NATURE),
                "Rock placed on reserved cell {cell:?}"
            );
        }
    }
}

/// Test: camps respect the minimum distance, whatever the load order.
#[test]
fn test_camp_tie_break_order_independent() {
    let ctx = ready(WorldConfig::default());
    let planner = ctx.camp_planner().unwrap();
    let biomes = ctx.biomes().unwrap();
    let min_distance = f64::from(ctx.config().camps.min_distance_between_camps);

    let keys: Vec<ChunkKey> = (-4..4)
        .flat_map(|y| (-4..4).map(move |x| ChunkKey::pack(x, y)))
        .collect();

    let forward: Vec<_> = keys.iter().filter_map(|&k| planner.plan(k, biomes)).collect();
    let backward: Vec<_> = keys.iter().rev().filter_map(|&k| planner.plan(k, biomes)).collect();

    let ids = |camps: &[wildmere_procedural::CampRuntime]| camps.iter().map(|c| c.id).collect::<HashSet<_>>();
    assert_eq!(ids(&forward), ids(&backward), "Load order changed the accepted camps");

    println!("Accepted {} camps over {} chunks", forward.len(), keys.len());
    for (i, a) in forward.iter().enumerate() {
        for b in &forward[i + 1..] {
            let d = (a.center.distance_squared(b.center) as f64).sqrt();
            assert!(d >= min_distance, "Camps {} and {} are {:.1} apart", a.id.0, b.id.0, d);
        }
    }
}

/// Test: zone tables of the default world cover [0, 1] and every cell has a zone.
#[test]
fn test_default_world_coverage() {
    let ctx = ready(WorldConfig::default());
    let climate = ctx.climate().unwrap();
    let biomes = ctx.biomes().unwrap();

    let bands: Vec<(f64, f64)> = climate
        .zones()
        .iter()
        .map(|z| (z.start_percent, z.end_percent))
        .collect();
    assert!(check_coverage(&bands, 0.0, 100.0).is_empty(), "Default zones leave gaps");

    for cell in climate.bounds().cells() {
        assert!(climate.zone_at(cell).is_some());
        assert!(biomes.biome_at(cell).is_some_and(|b| !b.is_void()));
    }
    assert!(climate.zone_at(Cell::new(10_000, 0)).is_none());
}
