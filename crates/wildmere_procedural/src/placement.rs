//! # Chunk Object Planner
//!
//! Scatters static content (trees, rocks, props) over one chunk.
//!
//! ## Algorithm
//!
//! Rules run in priority order (highest first). Each rule places up to
//! `round(target_per_chunk * density)` instances on cells of its biome; a
//! rule whose biome is absent from the chunk is skipped. Strategies:
//!
//! - `Uniform`: random cells, `8 * target` attempts
//! - `Clustered`: seed cells plus nearby satellites
//! - `BlueNoise`: first valid cell of each step-grid block
//!
//! Every accepted footprint is added to the chunk-local occupied set before
//! the next candidate is tested, so earlier rules shadow later ones.
//!
//! ## Determinism
//!
//! Randomness comes from a ChaCha stream keyed by `(seed, chunk, rule)`.
//! The same chunk with the same reservations always yields the same list.

use std::collections::HashSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wildmere_shared::{BiomeId, Cell, CellRect, ChunkKey, InstanceId, ObjectKind, Vec2};

use crate::biome::{BiomeCatalog, BiomeLayer};
use crate::config::{ClusterDef, PlacementMode, PlacementRuleDef, WorldConfig};
use crate::noise::{chunk_rng, mix64, NoiseChannel, WorldSeed};
use crate::reservation::{disc, ReservationMap, ReservationMask};

/// Salt of the placement streams.
const PLACEMENT_SALT: u64 = 0x0B_1EC7;
/// Salt of the per-rule noise gates.
const GATE_SALT: u64 = 0x6A_7E00;
/// Attempts per requested instance.
const RETRY_FACTOR: u32 = 8;
/// Attempts per satellite of a cluster.
const SATELLITE_ATTEMPTS: u32 = 4;

/// One placed object. The only output of the planner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectInstance {
    /// Globally unique id.
    pub id: InstanceId,
    /// Object type.
    pub kind: ObjectKind,
    /// Anchor cell (lowest corner of the footprint).
    pub cell: Cell,
    /// Visual variant.
    pub variant: u32,
    /// World position of the footprint center.
    pub world_pos: Vec2,
    /// Footprint `[width, height]` in cells.
    pub footprint: [u32; 2],
}

impl ObjectInstance {
    /// Footprint as a cell rectangle.
    #[must_use]
    pub const fn rect(&self) -> CellRect {
        CellRect::from_origin(self.cell, self.footprint[0], self.footprint[1])
    }
}

/// World position of the center of a footprint anchored at `cell`.
#[must_use]
pub fn footprint_center(cell: Cell, footprint: [u32; 2], cell_size: f32) -> Vec2 {
    Vec2::new(
        (cell.x as f32 + footprint[0] as f32 * 0.5) * cell_size,
        (cell.y as f32 + footprint[1] as f32 * 0.5) * cell_size,
    )
}

/// Noise gate with its resolved channel.
#[derive(Clone, Copy, Debug)]
pub struct NoiseGate {
    /// Channel sampled at the candidate cell.
    pub channel: NoiseChannel,
    /// Samples below this are rejected.
    pub threshold: f64,
}

/// A placement rule with biome names resolved.
#[derive(Clone, Debug)]
pub struct PlacementRule {
    /// Biome the rule applies to.
    pub biome: BiomeId,
    /// Object type placed.
    pub kind: ObjectKind,
    /// Instances per fully covered chunk.
    pub target_per_chunk: u32,
    /// Multiplier on the target.
    pub density: f64,
    /// Strategy.
    pub mode: PlacementMode,
    /// Higher runs first.
    pub priority: i32,
    /// Footprint `[width, height]`.
    pub footprint: [u32; 2],
    /// Number of variants.
    pub variants: u32,
    /// Blue-noise step source.
    pub min_distance_same_type: f32,
    /// Clearance from anything placed earlier in the pass.
    pub avoid_radius: Option<f32>,
    /// Optional noise gate.
    pub gate: Option<NoiseGate>,
    /// Cluster shape.
    pub cluster: ClusterDef,
    /// Another biome required within a radius.
    pub requires_nearby: Option<(BiomeId, u32)>,
    /// Reservation bits that veto this rule.
    pub avoid_mask: ReservationMask,
}

impl PlacementRule {
    /// Resolves a configured rule. Returns `None` (with a warning) if its
    /// biome is unknown to the catalog.
    #[must_use]
    pub fn resolve(def: &PlacementRuleDef, catalog: &BiomeCatalog, seed: WorldSeed) -> Option<Self> {
        let Some(biome) = catalog.id(&def.biome) else {
            warn!("Placement rule for kind {} skipped: unknown biome '{}'", def.kind, def.biome);
            return None;
        };
        let requires_nearby = match &def.requires_nearby_biome {
            Some(nearby) => {
                let Some(id) = catalog.id(&nearby.biome) else {
                    warn!(
                        "Placement rule for kind {} skipped: unknown neighbor biome '{}'",
                        def.kind, nearby.biome
                    );
                    return None;
                };
                Some((id, nearby.radius))
            }
            None => None,
        };
        let gate = def.noise.map(|gate| NoiseGate {
            channel: NoiseChannel::new(seed, GATE_SALT ^ u64::from(def.kind), gate.scale),
            threshold: gate.threshold,
        });

        Some(Self {
            biome,
            kind: ObjectKind(def.kind),
            target_per_chunk: def.target_per_chunk,
            density: def.density,
            mode: def.mode,
            priority: def.priority,
            footprint: [def.footprint[0].max(1), def.footprint[1].max(1)],
            variants: def.variants.max(1),
            min_distance_same_type: def.min_distance_same_type,
            avoid_radius: def.avoid_radius,
            gate,
            cluster: def.cluster,
            requires_nearby,
            avoid_mask: def.avoid_mask,
        })
    }

    /// Stream salt, stable under reordering of the rule table.
    fn salt(&self) -> u64 {
        mix64(PLACEMENT_SALT ^ (u64::from(self.kind.0) << 16) ^ u64::from(self.biome.0))
    }
}

/// State of one generation pass over one chunk.
struct ChunkPass<'a> {
    key: ChunkKey,
    rect: CellRect,
    biomes: &'a BiomeLayer,
    reservations: &'a ReservationMap,
    occupied: HashSet<Cell>,
    placed: Vec<ObjectInstance>,
    cell_size: f32,
}

impl ChunkPass<'_> {
    /// `IsAllowed`: reservation, biome, noise, footprint, clearance, neighbor biome.
    fn is_allowed(&self, rule: &PlacementRule, cell: Cell, skip_noise: bool) -> bool {
        let footprint = CellRect::from_origin(cell, rule.footprint[0], rule.footprint[1]);
        if !self.rect.contains_rect(&footprint) {
            return false;
        }
        if footprint
            .cells()
            .any(|c| self.reservations.is_reserved(c, rule.avoid_mask))
        {
            return false;
        }
        if self.biomes.biome_at(cell) != Some(rule.biome) {
            return false;
        }
        if !skip_noise {
            if let Some(gate) = &rule.gate {
                if gate.channel.sample(cell) < gate.threshold {
                    return false;
                }
            }
        }
        if footprint.cells().any(|c| self.occupied.contains(&c)) {
            return false;
        }
        if let Some(radius) = rule.avoid_radius {
            if self.near_occupied(cell, radius) {
                return false;
            }
        }
        if let Some((neighbor, radius)) = rule.requires_nearby {
            if !self.biomes.any_within(cell, radius, neighbor) {
                return false;
            }
        }
        true
    }

    fn near_occupied(&self, cell: Cell, radius: f32) -> bool {
        if self.occupied.is_empty() {
            return false;
        }
        let r_sq = f64::from(radius) * f64::from(radius);
        disc(cell, radius.ceil().max(0.0) as u32)
            .any(|c| self.occupied.contains(&c) && (cell.distance_squared(c) as f64) <= r_sq)
    }

    fn place(&mut self, rule: &PlacementRule, cell: Cell, rng: &mut ChaCha8Rng) {
        let footprint = CellRect::from_origin(cell, rule.footprint[0], rule.footprint[1]);
        self.occupied.extend(footprint.cells());
        let index = self.placed.len() as u32;
        self.placed.push(ObjectInstance {
            id: InstanceId::new(self.key, index),
            kind: rule.kind,
            cell,
            variant: rng.gen_range(0..rule.variants.max(1)),
            world_pos: footprint_center(cell, rule.footprint, self.cell_size),
            footprint: rule.footprint,
        });
    }

    fn random_cell(&self, rng: &mut ChaCha8Rng) -> Cell {
        self.rect.min.offset(
            rng.gen_range(0..self.rect.width()),
            rng.gen_range(0..self.rect.height()),
        )
    }
}

/// Deterministic per-chunk object planner.
#[derive(Clone, Debug)]
pub struct ObjectPlanner {
    seed: WorldSeed,
    chunk_size: u32,
    cell_size: f32,
    rules: Vec<PlacementRule>,
}

impl ObjectPlanner {
    /// Resolves the configured rules against the biome catalog.
    #[must_use]
    pub fn new(config: &WorldConfig, catalog: &BiomeCatalog, seed: WorldSeed) -> Self {
        let rules = config
            .placement
            .iter()
            .filter_map(|def| PlacementRule::resolve(def, catalog, seed))
            .collect();
        Self::with_rules(seed, config.chunk_size, config.cell_size, rules)
    }

    /// Creates a planner from already-resolved rules.
    #[must_use]
    pub fn with_rules(seed: WorldSeed, chunk_size: u32, cell_size: f32, mut rules: Vec<PlacementRule>) -> Self {
        // Priority first, then catalog order; ties keep table order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.biome.cmp(&b.biome)));
        Self {
            seed,
            chunk_size,
            cell_size,
            rules,
        }
    }

    /// Rules in execution order.
    #[must_use]
    pub fn rules(&self) -> &[PlacementRule] {
        &self.rules
    }

    /// Chunk size in cells.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Plans every object of one chunk.
    #[must_use]
    pub fn plan_chunk(
        &self,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &ReservationMap,
    ) -> Vec<ObjectInstance> {
        let rect = key.coord().cell_rect(self.chunk_size);
        let present: HashSet<BiomeId> = rect.cells().filter_map(|cell| biomes.biome_at(cell)).collect();

        let mut pass = ChunkPass {
            key,
            rect,
            biomes,
            reservations,
            occupied: HashSet::new(),
            placed: Vec::new(),
            cell_size: self.cell_size,
        };

        for rule in &self.rules {
            if !present.contains(&rule.biome) {
                continue;
            }
            let target = (f64::from(rule.target_per_chunk) * rule.density).round();
            if target < 1.0 {
                continue;
            }
            let target = target as u32;

            let mut rng = chunk_rng(self.seed, key, rule.salt());
            match rule.mode {
                PlacementMode::Uniform => place_uniform(&mut pass, rule, target, &mut rng),
                PlacementMode::Clustered => place_clustered(&mut pass, rule, target, &mut rng),
                PlacementMode::BlueNoise => place_blue_noise(&mut pass, rule, target, &mut rng),
            }
        }

        pass.placed
    }
}

fn place_uniform(pass: &mut ChunkPass<'_>, rule: &PlacementRule, target: u32, rng: &mut ChaCha8Rng) {
    let mut placed = 0;
    for _ in 0..target.saturating_mul(RETRY_FACTOR) {
        if placed >= target {
            break;
        }
        let cell = pass.random_cell(rng);
        if pass.is_allowed(rule, cell, false) {
            pass.place(rule, cell, rng);
            placed += 1;
        }
    }
}

fn place_clustered(pass: &mut ChunkPass<'_>, rule: &PlacementRule, target: u32, rng: &mut ChaCha8Rng) {
    let min_sat = rule.cluster.min_satellites;
    let max_sat = rule.cluster.max_satellites.max(min_sat);
    let average = (f64::from(min_sat) + f64::from(max_sat)) * 0.5;
    let seeds = ((f64::from(target) / average.max(1.0)).round() as u32).max(1);
    let radius = rule.cluster.radius.max(1) as i32;

    let mut placed = 0;
    let mut seeded = 0;
    for _ in 0..seeds.saturating_mul(RETRY_FACTOR) {
        if seeded >= seeds || placed >= target {
            break;
        }
        let seed_cell = pass.random_cell(rng);
        if !pass.is_allowed(rule, seed_cell, false) {
            continue;
        }
        pass.place(rule, seed_cell, rng);
        placed += 1;
        seeded += 1;

        let satellites = rng.gen_range(min_sat..=max_sat);
        for _ in 0..satellites {
            if placed >= target {
                break;
            }
            for _ in 0..SATELLITE_ATTEMPTS {
                let cell = seed_cell.offset(rng.gen_range(-radius..=radius), rng.gen_range(-radius..=radius));
                // Cluster membership replaces the noise gate
                if pass.is_allowed(rule, cell, true) {
                    pass.place(rule, cell, rng);
                    placed += 1;
                    break;
                }
            }
        }
    }
}

fn place_blue_noise(pass: &mut ChunkPass<'_>, rule: &PlacementRule, target: u32, rng: &mut ChaCha8Rng) {
    let step = (rule.min_distance_same_type.round() as i32).max(1);
    let origin = pass.rect.min;
    let mut placed = 0;

    let mut by = 0;
    while by < pass.rect.height() {
        let mut bx = 0;
        while bx < pass.rect.width() {
            if placed >= target {
                return;
            }
            let block_w = step.min(pass.rect.width() - bx);
            let block_h = step.min(pass.rect.height() - by);
            let block_area = block_w * block_h;
            let start = rng.gen_range(0..block_area);

            for i in 0..block_area {
                let local = (start + i) % block_area;
                let cell = origin.offset(bx + local % block_w, by + local / block_w);
                if pass.is_allowed(rule, cell, false) {
                    pass.place(rule, cell, rng);
                    placed += 1;
                    break;
                }
            }
            bx += step;
        }
        by += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{banded_config, layers};

    fn rule(biome: BiomeId, kind: u32, target: u32, mode: PlacementMode) -> PlacementRule {
        PlacementRule {
            biome,
            kind: ObjectKind(kind),
            target_per_chunk: target,
            density: 1.0,
            mode,
            priority: 0,
            footprint: [1, 1],
            variants: 3,
            min_distance_same_type: 6.0,
            avoid_radius: None,
            gate: None,
            cluster: ClusterDef::default(),
            requires_nearby: None,
            avoid_mask: ReservationMask::NATURE,
        }
    }

    fn plains() -> BiomeLayer {
        let config = banded_config(&[("plains", 0.0, 100.0)], [64, 64]);
        layers(&config, WorldSeed::new(12345)).1
    }

    fn assert_no_overlap(objects: &[ObjectInstance]) {
        let mut seen = HashSet::new();
        for object in objects {
            for cell in object.rect().cells() {
                assert!(seen.insert(cell), "Footprint overlap at {:?}", cell);
            }
        }
    }

    #[test]
    fn test_uniform_is_deterministic() {
        let biomes = plains();
        let planner = ObjectPlanner::with_rules(
            WorldSeed::new(12345),
            64,
            1.0,
            vec![rule(BiomeId(0), 1, 40, PlacementMode::Uniform)],
        );
        let reservations = ReservationMap::new();

        let a = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &reservations);
        let b = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &reservations);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        for (index, object) in a.iter().enumerate() {
            assert_eq!(object.id, InstanceId::new(ChunkKey::pack(0, 0), index as u32));
            assert!(object.variant < 3);
        }
    }

    #[test]
    fn test_large_footprints_never_overlap() {
        let biomes = plains();
        let mut big = rule(BiomeId(0), 2, 200, PlacementMode::Uniform);
        big.footprint = [3, 2];
        let mut clustered = rule(BiomeId(0), 3, 80, PlacementMode::Clustered);
        clustered.footprint = [2, 2];
        let planner = ObjectPlanner::with_rules(WorldSeed::new(5), 64, 1.0, vec![big, clustered]);

        let objects = planner.plan_chunk(ChunkKey::pack(0, -1), &biomes, &ReservationMap::new());
        assert!(!objects.is_empty());
        assert_no_overlap(&objects);

        let rect = ChunkKey::pack(0, -1).coord().cell_rect(64);
        assert!(objects.iter().all(|o| rect.contains_rect(&o.rect())), "Footprints stay in chunk");
    }

    #[test]
    fn test_reserved_cells_are_skipped() {
        let biomes = plains();
        let planner = ObjectPlanner::with_rules(
            WorldSeed::new(9),
            64,
            1.0,
            vec![rule(BiomeId(0), 1, 300, PlacementMode::Uniform)],
        );
        let mut reservations = ReservationMap::new();
        reservations.reserve_circle(Cell::new(32, 32), 20, ReservationMask::NATURE);

        let objects = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &reservations);
        assert!(!objects.is_empty());
        for object in &objects {
            assert!(!reservations.is_reserved(object.cell, ReservationMask::NATURE));
        }

        // A mask the rule does not govern has no effect
        let mut creatures_only = ReservationMap::new();
        creatures_only.reserve_circle(Cell::new(32, 32), 20, ReservationMask::CREATURES);
        let unrestricted = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &creatures_only);
        assert!(unrestricted.iter().any(|o| creatures_only.is_reserved(o.cell, ReservationMask::ALL)));
    }

    #[test]
    fn test_blue_noise_one_per_block() {
        let biomes = plains();
        let planner = ObjectPlanner::with_rules(
            WorldSeed::new(2),
            64,
            1.0,
            vec![rule(BiomeId(0), 4, 1000, PlacementMode::BlueNoise)],
        );
        let objects = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &ReservationMap::new());

        // step 6 over 64 cells: 11 blocks per axis
        assert_eq!(objects.len(), 121);
        let mut blocks = HashSet::new();
        for object in &objects {
            assert!(blocks.insert((object.cell.x / 6, object.cell.y / 6)));
        }
    }

    #[test]
    fn test_partial_coverage_reaches_full_target() {
        let config = banded_config(&[("forest", 0.0, 75.0), ("plains", 75.0, 100.0)], [64, 64]);
        let (_, biomes) = layers(&config, WorldSeed::new(1));
        let forest = biomes.catalog().id("forest").unwrap();
        let planner = ObjectPlanner::with_rules(
            WorldSeed::new(1),
            64,
            1.0,
            vec![rule(forest, 1, 10, PlacementMode::Uniform)],
        );
        let key = ChunkKey::pack(0, 0);
        let rect = key.coord().cell_rect(64);
        let forest_cells = biomes.count_in(&rect, forest);
        assert!(forest_cells > 0 && forest_cells < 64 * 64, "Chunk must be partly forest");

        let objects = planner.plan_chunk(key, &biomes, &ReservationMap::new());
        assert_eq!(objects.len(), 10);
        assert!(objects.iter().all(|o| biomes.biome_at(o.cell) == Some(forest)));
    }

    #[test]
    fn test_absent_biome_places_nothing() {
        let config = banded_config(&[("forest", 0.0, 50.0), ("plains", 50.0, 100.0)], [64, 64]);
        let (_, biomes) = layers(&config, WorldSeed::new(1));
        let forest = biomes.catalog().id("forest").unwrap();
        let planner = ObjectPlanner::with_rules(
            WorldSeed::new(1),
            32,
            1.0,
            vec![rule(forest, 1, 20, PlacementMode::Uniform)],
        );

        // Chunk (0, -1) of size 32 spans y in [-32, 0): all forest
        let full = planner.plan_chunk(ChunkKey::pack(0, -1), &biomes, &ReservationMap::new());
        assert_eq!(full.len(), 20);

        // Chunk (0, 0) spans y in [0, 32): all plains
        let none = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &ReservationMap::new());
        assert!(none.is_empty());
    }

    #[test]
    fn test_priority_runs_first() {
        let biomes = plains();
        let mut low = rule(BiomeId(0), 1, 5, PlacementMode::Uniform);
        low.priority = -1;
        let mut high = rule(BiomeId(0), 2, 5, PlacementMode::Uniform);
        high.priority = 10;
        let planner = ObjectPlanner::with_rules(WorldSeed::new(3), 64, 1.0, vec![low, high]);

        assert_eq!(planner.rules()[0].kind, ObjectKind(2));
        let objects = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &ReservationMap::new());
        assert!(objects[..5].iter().all(|o| o.kind == ObjectKind(2)));
    }

    #[test]
    fn test_avoid_radius_keeps_clearance() {
        let biomes = plains();
        let mut sparse = rule(BiomeId(0), 7, 30, PlacementMode::Uniform);
        sparse.avoid_radius = Some(5.0);
        let planner = ObjectPlanner::with_rules(WorldSeed::new(11), 64, 1.0, vec![sparse]);
        let objects = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &ReservationMap::new());

        for (i, a) in objects.iter().enumerate() {
            for b in &objects[i + 1..] {
                assert!(a.cell.distance_squared(b.cell) > 25, "{:?} too close to {:?}", a.cell, b.cell);
            }
        }
    }

    #[test]
    fn test_requires_nearby_biome() {
        let config = banded_config(&[("forest", 0.0, 50.0), ("plains", 50.0, 100.0)], [64, 64]);
        let (_, biomes) = layers(&config, WorldSeed::new(1));
        let forest = biomes.catalog().id("forest").unwrap();
        let plains = biomes.catalog().id("plains").unwrap();

        let mut reeds = rule(plains, 5, 50, PlacementMode::Uniform);
        reeds.requires_nearby = Some((forest, 3));
        let planner = ObjectPlanner::with_rules(WorldSeed::new(1), 64, 1.0, vec![reeds]);

        let objects = planner.plan_chunk(ChunkKey::pack(0, 0), &biomes, &ReservationMap::new());
        assert!(!objects.is_empty());
        assert!(objects.iter().all(|o| o.cell.y <= 2), "Only cells within 3 of the forest band");
    }

    #[test]
    fn test_unknown_biome_rule_skipped() {
        let catalog = BiomeCatalog::default();
        let def = PlacementRuleDef {
            biome: "nowhere".into(),
            ..PlacementRuleDef::default()
        };
        assert!(PlacementRule::resolve(&def, &catalog, WorldSeed::new(1)).is_none());
    }
}
