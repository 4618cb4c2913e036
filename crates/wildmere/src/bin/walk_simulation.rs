//! # Walk Simulation
//!
//! Walks an observer across the world, posts a few edits, regenerates once
//! with a new seed halfway, and prints what every streamer did.
//!
//! Usage: `walk_simulation [config.toml]`
//! Without an argument the bundled default world is used.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use wildmere::procedural::{InMemoryDeltaStore, ObjectInstance, WorldConfig};
use wildmere::shared::{InstanceId, PlannedUnit, UnitId, Vec2, WorldEvent};
use wildmere::{
    Collaborators, ObjectOwner, ObjectView, RuntimeResult, TileChunk, TileSink, UnitSpawner,
    WorldRuntime,
};

const DEFAULT_CONFIG: &str = "data/worldgen/default_world.toml";
const STEPS: u32 = 2_000;
const STEP_LENGTH: f32 = 1.5;

/// Counters shared by the console collaborators.
#[derive(Debug, Default)]
struct Census {
    tile_chunks: i64,
    land_tiles: u64,
    visible: HashMap<ObjectOwner, Vec<InstanceId>>,
    removed: u64,
    changed: u64,
    units: i64,
    spawned: u64,
}

#[derive(Clone)]
struct Console(Rc<RefCell<Census>>);

impl TileSink for Console {
    fn tiles_loaded(&mut self, chunk: &TileChunk) {
        let mut census = self.0.borrow_mut();
        census.tile_chunks += 1;
        census.land_tiles += chunk.land_count() as u64;
    }

    fn tiles_released(&mut self, _key: wildmere::shared::ChunkKey) {
        self.0.borrow_mut().tile_chunks -= 1;
    }
}

impl ObjectView for Console {
    fn show(&mut self, owner: ObjectOwner, objects: &[ObjectInstance]) {
        let ids = objects.iter().map(|o| o.id).collect();
        self.0.borrow_mut().visible.insert(owner, ids);
    }

    fn hide(&mut self, owner: ObjectOwner) {
        self.0.borrow_mut().visible.remove(&owner);
    }

    fn object_removed(&mut self, _id: InstanceId) {
        self.0.borrow_mut().removed += 1;
    }

    fn object_changed(&mut self, _object: &ObjectInstance) {
        self.0.borrow_mut().changed += 1;
    }
}

impl UnitSpawner for Console {
    fn spawn(&mut self, units: &[PlannedUnit]) {
        let mut census = self.0.borrow_mut();
        census.units += units.len() as i64;
        census.spawned += units.len() as u64;
    }

    fn despawn(&mut self, ids: &[UnitId]) {
        self.0.borrow_mut().units -= ids.len() as i64;
    }
}

fn main() -> RuntimeResult<()> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           WILDMERE WALK SIMULATION                               ║");
    println!("║           Stream → Edit → Regenerate → Stream                    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = WorldConfig::from_file(&path)?;
    println!("Config: {}  (seed {}, half extent {:?})", path, config.seed, config.half_extent);

    let census = Rc::new(RefCell::new(Census::default()));
    let console = Console(Rc::clone(&census));
    let collaborators = Collaborators::builder()
        .tiles(console.clone())
        .objects(console.clone())
        .units(console)
        .deltas(InMemoryDeltaStore::new())
        .build();

    let half = config.half_extent[0] as f32 * config.cell_size;
    let mut runtime = WorldRuntime::new(config, collaborators)?;
    let sender = runtime.sender();

    let start = Instant::now();
    let mut slowest_us = 0u64;
    let mut observer = Vec2::new(-half * 0.8, -half * 0.5);
    let heading = Vec2::new(0.8, 0.6);

    for step in 0..STEPS {
        observer = observer + heading * STEP_LENGTH;
        if observer.x > half || observer.y > half {
            observer = Vec2::new(-half * 0.8, -half * 0.5);
        }

        if step == STEPS / 2 {
            println!("Step {step}: requesting regeneration with seed 777");
            sender.request_regeneration(777, runtime.context().config().half_extent);
        }

        // Chop the first visible object every 100 steps.
        if step % 100 == 50 {
            let victim = census
                .borrow()
                .visible
                .iter()
                .filter(|(owner, _)| matches!(owner, ObjectOwner::Chunk(_)))
                .find_map(|(_, ids)| ids.first().copied());
            if let Some(id) = victim {
                sender.send(WorldEvent::ObjectDestroyed { id });
            }
        }

        let stats = runtime.tick(observer);
        slowest_us = slowest_us.max(stats.elapsed_us);
        if stats.loaded() + stats.released() > 0 && step % 250 == 0 {
            println!(
                "Step {:>5} @ ({:>7.1}, {:>7.1}): +{} / -{} chunks, {} objects, {} camps",
                step,
                observer.x,
                observer.y,
                stats.loaded(),
                stats.released(),
                runtime.object_count(),
                runtime.camp_count()
            );
        }
    }

    let elapsed = start.elapsed();
    let census = census.borrow();
    println!();
    println!("Walked {} steps in {:?} (slowest tick {:.2}ms)", STEPS, elapsed, slowest_us as f64 / 1000.0);
    if let Some(stats) = runtime.stats() {
        for (name, s) in [
            ("tiles", stats.tiles),
            ("camps", stats.camps),
            ("objects", stats.objects),
            ("creatures", stats.creatures),
        ] {
            println!(
                "  {:<10} loaded {:>5}  released {:>5}  active {:>4}  evaluations {:>4}",
                name, s.loaded_total, s.released_total, s.active, s.evaluations
            );
        }
    }
    println!("  tile chunks visible: {}, land tiles streamed: {}", census.tile_chunks, census.land_tiles);
    println!("  object batches visible: {}, removed: {}, changed: {}", census.visible.len(), census.removed, census.changed);
    println!("  units alive: {}, spawned total: {}", census.units, census.spawned);
    Ok(())
}
