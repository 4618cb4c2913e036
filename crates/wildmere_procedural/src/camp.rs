//! # Camp Planner
//!
//! Decides per chunk whether a camp exists, lays out its structures and
//! plans its NPC roster. Nothing is instantiated here.
//!
//! ## Candidate protocol
//!
//! 1. A chunk-local stream jitters the chunk center by up to a third of the
//!    chunk size.
//! 2. The candidate is gated by biome, an optional noise threshold and a
//!    fair coin.
//! 3. Every neighbor chunk within `min_distance_between_camps` recomputes
//!    its own candidate. A conflicting neighbor with a lower tie-break key
//!    suppresses this one.
//!
//! Every step is a pure function of `(seed, chunk, salt)`, so the accepted
//! set does not depend on the order in which chunks stream in.

use std::collections::{BTreeMap, HashSet};
use std::f32::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use wildmere_shared::{
    BiomeId, CampId, Cell, CellRect, ChunkKey, InstanceId, ObjectKind, PlannedUnit, ProfileId,
    UnitId, UnitOwner,
};

use crate::biome::{BiomeCatalog, BiomeLayer};
use crate::config::{
    NpcAnchor, NpcEntryDef, StructureDef, StructureDistribution, StructureRole, WorldConfig,
    MAX_SPACING_CHUNKS,
};
use crate::noise::{chunk_rng, hash_key, NoiseChannel, WorldSeed};
use crate::placement::{footprint_center, NoiseGate, ObjectInstance};
use crate::reservation::{ReservationMap, ReservationMask};

/// Set on the index of every camp structure id, separating them from
/// vegetation ids of the same chunk.
pub const CAMP_INDEX_BIT: u32 = 1 << 31;

const TIE_SALT: u64 = 0x71E_B2EA;
const LAYOUT_SALT: u64 = 0x1A_7000;
const NPC_SALT: u64 = 0x4E_9C00;
const GATE_SALT: u64 = 0xCA_6A7E;
const STRUCTURE_ATTEMPTS: u32 = 6;
const NPC_ATTEMPTS: u32 = 8;

/// A gated camp candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CampCandidate {
    /// Owning chunk.
    pub chunk: ChunkKey,
    /// Camp center cell.
    pub center: Cell,
    /// Tie-break key; lower wins.
    pub tie_key: u64,
}

impl CampCandidate {
    /// Returns true if `self` wins a conflict against `other`.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        (self.tie_key, self.chunk.raw()) < (other.tie_key, other.chunk.raw())
    }
}

/// One placed camp structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CampStructure {
    /// Placed object record.
    pub instance: ObjectInstance,
    /// Anchor role for NPC planning.
    pub role: StructureRole,
}

impl CampStructure {
    fn center_cell(&self) -> Cell {
        self.instance.cell.offset(
            (self.instance.footprint[0] / 2) as i32,
            (self.instance.footprint[1] / 2) as i32,
        )
    }
}

/// A reserved circle, kept so it can be released exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleClaim {
    /// Circle center.
    pub center: Cell,
    /// Radius in cells.
    pub radius: u32,
    /// Bits reserved.
    pub mask: ReservationMask,
}

/// A camp that exists while its chunk is active.
#[derive(Clone, Debug, PartialEq)]
pub struct CampRuntime {
    /// Camp identity.
    pub id: CampId,
    /// Center cell.
    pub center: Cell,
    /// Placed structures.
    pub structures: Vec<CampStructure>,
    /// Planned NPC slots.
    pub npcs: Vec<PlannedUnit>,
    /// Reservations held by this camp.
    pub claims: Vec<CircleClaim>,
}

/// Deterministic camp planner.
#[derive(Clone, Debug)]
pub struct CampPlanner {
    seed: WorldSeed,
    enabled: bool,
    salt: u64,
    chunk_size: u32,
    cell_size: f32,
    allowed: Vec<BiomeId>,
    gate: Option<NoiseGate>,
    min_distance: f32,
    footprint_radius: u32,
    no_spawn_ring: u32,
    structures: Vec<StructureDef>,
    npcs: Vec<NpcEntryDef>,
}

impl CampPlanner {
    /// Creates the planner; unknown allowed biomes are dropped with a warning.
    #[must_use]
    pub fn new(config: &WorldConfig, catalog: &BiomeCatalog, seed: WorldSeed) -> Self {
        let camps = &config.camps;
        let allowed = camps
            .allowed_biomes
            .iter()
            .filter_map(|name| {
                let id = catalog.id(name);
                if id.is_none() {
                    warn!("Camp biome '{}' is not in the catalog; ignored", name);
                }
                id
            })
            .collect();

        Self {
            seed,
            enabled: camps.enabled,
            salt: camps.salt,
            chunk_size: config.chunk_size,
            cell_size: config.cell_size,
            allowed,
            gate: camps.noise.map(|gate| NoiseGate {
                channel: NoiseChannel::new(seed, camps.salt ^ GATE_SALT, gate.scale),
                threshold: gate.threshold,
            }),
            min_distance: camps.min_distance_between_camps,
            footprint_radius: camps.footprint_radius,
            no_spawn_ring: camps.no_spawn_ring,
            structures: camps.structures.clone(),
            npcs: camps.npcs.clone(),
        }
    }

    /// Chunk size in cells.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Gated candidate of one chunk, with no neighbor check.
    #[must_use]
    pub fn candidate(&self, key: ChunkKey, biomes: &BiomeLayer) -> Option<CampCandidate> {
        if !self.enabled || self.allowed.is_empty() {
            return None;
        }
        let mut rng = chunk_rng(self.seed, key, self.salt);
        let size = self.chunk_size as i32;
        let jitter = size / 3;
        let center = key.coord().origin(self.chunk_size).offset(
            size / 2 + rng.gen_range(-jitter..=jitter),
            size / 2 + rng.gen_range(-jitter..=jitter),
        );

        let biome = biomes.biome_at(center)?;
        if !self.allowed.contains(&biome) {
            return None;
        }
        if let Some(gate) = &self.gate {
            if gate.channel.sample(center) < gate.threshold {
                return None;
            }
        }
        if !rng.gen_bool(0.5) {
            return None;
        }

        Some(CampCandidate {
            chunk: key,
            center,
            tie_key: hash_key(self.seed, key.raw(), self.salt ^ TIE_SALT),
        })
    }

    /// Chunk radius that can hold a conflicting candidate.
    #[must_use]
    pub fn neighbor_radius(&self) -> i32 {
        let chunks = (self.min_distance.max(0.0) / self.chunk_size as f32).ceil() as i32;
        chunks.min(MAX_SPACING_CHUNKS as i32)
    }

    /// Returns false if a conflicting neighbor candidate wins.
    #[must_use]
    pub fn wins_tie_break(&self, candidate: &CampCandidate, biomes: &BiomeLayer) -> bool {
        let radius = self.neighbor_radius();
        let min_sq = f64::from(self.min_distance) * f64::from(self.min_distance);
        let coord = candidate.chunk.coord();

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbor = ChunkKey::pack(coord.x + dx, coord.y + dy);
                let Some(other) = self.candidate(neighbor, biomes) else {
                    continue;
                };
                let close = (candidate.center.distance_squared(other.center) as f64) < min_sq;
                if close && other.beats(candidate) {
                    return false;
                }
            }
        }
        true
    }

    /// Full plan of a chunk's camp, or `None` if the chunk has none.
    ///
    /// Pure: makes no reservations.
    #[must_use]
    pub fn plan(&self, key: ChunkKey, biomes: &BiomeLayer) -> Option<CampRuntime> {
        let candidate = self.candidate(key, biomes)?;
        if !self.wins_tie_break(&candidate, biomes) {
            debug!("Camp candidate in chunk {} suppressed by a neighbor", key);
            return None;
        }
        Some(self.layout(&candidate))
    }

    /// Plans a camp and makes its reservations.
    pub fn activate(
        &self,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &mut ReservationMap,
    ) -> Option<CampRuntime> {
        let camp = self.plan(key, biomes)?;
        for claim in &camp.claims {
            reservations.reserve_circle(claim.center, claim.radius, claim.mask);
        }
        Some(camp)
    }

    /// Releases every reservation a camp made.
    pub fn release(camp: &CampRuntime, reservations: &mut ReservationMap) {
        for claim in &camp.claims {
            reservations.release_circle(claim.center, claim.radius, claim.mask);
        }
    }

    fn layout(&self, candidate: &CampCandidate) -> CampRuntime {
        let key = candidate.chunk;
        let center = candidate.center;
        let mut rng = chunk_rng(self.seed, key, self.salt ^ LAYOUT_SALT);
        let mut occupied = HashSet::new();

        let structures = self.place_structures(key, center, &mut rng, &mut occupied);
        let npcs = self.plan_npcs(key, center, &structures, &mut rng, &occupied);

        let claims = vec![
            CircleClaim {
                center,
                radius: self.footprint_radius,
                mask: ReservationMask::CAMPS | ReservationMask::NATURE,
            },
            CircleClaim {
                center,
                radius: self.footprint_radius + self.no_spawn_ring,
                mask: ReservationMask::CREATURES,
            },
        ];

        CampRuntime {
            id: CampId(key),
            center,
            structures,
            npcs,
            claims,
        }
    }

    fn place_structures(
        &self,
        key: ChunkKey,
        center: Cell,
        rng: &mut ChaCha8Rng,
        occupied: &mut HashSet<Cell>,
    ) -> Vec<CampStructure> {
        let mut placed: Vec<CampStructure> = Vec::new();

        for def in &self.structures {
            let count = rng.gen_range(def.count[0]..=def.count[1].max(def.count[0]));
            let phase = rng.gen::<f32>() * TAU;
            let [fw, fh] = [def.footprint[0].max(1), def.footprint[1].max(1)];
            let spacing_sq = def.min_spacing * def.min_spacing;
            let mut same_type: Vec<Cell> = Vec::new();

            for i in 0..count {
                let ideal = structure_slot(def, i, count, phase, center, rng);
                for attempt in 0..STRUCTURE_ATTEMPTS {
                    let pos = if attempt == 0 {
                        ideal
                    } else {
                        ideal.offset(rng.gen_range(-2..=2), rng.gen_range(-2..=2))
                    };
                    let anchor = pos.offset(-((fw / 2) as i32), -((fh / 2) as i32));
                    let rect = CellRect::from_origin(anchor, fw, fh);
                    if rect.cells().any(|c| occupied.contains(&c)) {
                        continue;
                    }
                    if same_type
                        .iter()
                        .any(|other| (other.distance_squared(pos) as f32) < spacing_sq)
                    {
                        continue;
                    }

                    occupied.extend(rect.cells());
                    same_type.push(pos);
                    let index = CAMP_INDEX_BIT | placed.len() as u32;
                    placed.push(CampStructure {
                        instance: ObjectInstance {
                            id: InstanceId::new(key, index),
                            kind: ObjectKind(def.kind),
                            cell: anchor,
                            variant: rng.gen_range(0..def.variants.max(1)),
                            world_pos: footprint_center(anchor, [fw, fh], self.cell_size),
                            footprint: [fw, fh],
                        },
                        role: def.role,
                    });
                    break;
                }
            }
        }
        placed
    }

    fn plan_npcs(
        &self,
        key: ChunkKey,
        center: Cell,
        structures: &[CampStructure],
        rng: &mut ChaCha8Rng,
        occupied: &HashSet<Cell>,
    ) -> Vec<PlannedUnit> {
        let owner = UnitOwner::Camp(CampId(key));
        let mut npcs: Vec<PlannedUnit> = Vec::new();

        for (entry_index, entry) in self.npcs.iter().enumerate() {
            let count = rng.gen_range(entry.count[0]..=entry.count[1].max(entry.count[0]));
            let phase = rng.gen::<f32>() * TAU;
            let anchors: Vec<(Cell, f32)> = match anchor_role(entry.anchor) {
                Some(role) => structures
                    .iter()
                    .filter(|s| s.role == role)
                    .map(|s| {
                        let reach = s.instance.footprint[0].max(s.instance.footprint[1]) as f32 * 0.5 + 1.0;
                        (s.center_cell(), reach)
                    })
                    .collect(),
                None => Vec::new(),
            };
            let jitter = entry.jitter.max(0.0).round() as i32;
            let spacing_sq = entry.min_spacing * entry.min_spacing;

            for i in 0..count {
                for _ in 0..NPC_ATTEMPTS {
                    let base = match entry.anchor {
                        NpcAnchor::Perimeter => ring_point(
                            center,
                            self.footprint_radius as f32,
                            phase + TAU * i as f32 / count as f32,
                        ),
                        NpcAnchor::Anywhere => scatter_point(center, self.footprint_radius as f32, rng),
                        NpcAnchor::NearTents | NpcAnchor::NearFire | NpcAnchor::NearGate
                            if !anchors.is_empty() =>
                        {
                            let (anchor, reach) = anchors[i as usize % anchors.len()];
                            ring_point(anchor, reach, rng.gen::<f32>() * TAU)
                        }
                        // Missing anchor structures fall back to the center
                        _ => center,
                    };
                    let cell = base.offset(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter));

                    if occupied.contains(&cell) {
                        continue;
                    }
                    if npcs
                        .iter()
                        .any(|npc| (npc.cell.distance_squared(cell) as f32) < spacing_sq)
                    {
                        continue;
                    }

                    let slot = ((entry_index as u64) << 32) | u64::from(i);
                    npcs.push(PlannedUnit {
                        id: UnitId(hash_key(self.seed, key.raw(), NPC_SALT ^ slot)),
                        cell,
                        profile: ProfileId(entry.profile),
                        owner,
                    });
                    break;
                }
            }
        }
        npcs
    }
}

const fn anchor_role(anchor: NpcAnchor) -> Option<StructureRole> {
    match anchor {
        NpcAnchor::NearTents => Some(StructureRole::Tent),
        NpcAnchor::NearFire => Some(StructureRole::Fire),
        NpcAnchor::NearGate => Some(StructureRole::Gate),
        _ => None,
    }
}

fn ring_point(center: Cell, radius: f32, angle: f32) -> Cell {
    center.offset(
        (angle.cos() * radius).round() as i32,
        (angle.sin() * radius).round() as i32,
    )
}

fn scatter_point(center: Cell, radius: f32, rng: &mut ChaCha8Rng) -> Cell {
    let angle = rng.gen::<f32>() * TAU;
    let distance = radius * rng.gen::<f32>().sqrt();
    ring_point(center, distance, angle)
}

/// Ideal center cell of the `i`-th of `count` structures.
fn structure_slot(
    def: &StructureDef,
    i: u32,
    count: u32,
    phase: f32,
    center: Cell,
    rng: &mut ChaCha8Rng,
) -> Cell {
    let step = TAU * i as f32 / count.max(1) as f32;
    match def.distribution {
        StructureDistribution::Center => center,
        StructureDistribution::Ring => ring_point(center, def.radius, phase + step),
        StructureDistribution::InnerRing => ring_point(center, def.radius * 0.5, phase + step),
        StructureDistribution::Grid => {
            let side = (count as f32).sqrt().ceil().max(1.0) as u32;
            let half = (side - 1) as f32 * 0.5;
            let gx = (i % side) as f32 - half;
            let gy = (i / side) as f32 - half;
            center.offset((gx * def.radius).round() as i32, (gy * def.radius).round() as i32)
        }
        StructureDistribution::RandomScatter => scatter_point(center, def.radius, rng),
    }
}

/// Camps of the currently active chunks.
#[derive(Debug, Default)]
pub struct ActiveCamps {
    camps: BTreeMap<ChunkKey, CampRuntime>,
}

impl ActiveCamps {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the camp of `key`, if it has one. Idempotent.
    pub fn activate(
        &mut self,
        planner: &CampPlanner,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &mut ReservationMap,
    ) -> Option<&CampRuntime> {
        if !self.camps.contains_key(&key) {
            let camp = planner.activate(key, biomes, reservations)?;
            debug!(
                "Camp activated in chunk {}: {} structures, {} NPCs",
                key,
                camp.structures.len(),
                camp.npcs.len()
            );
            self.camps.insert(key, camp);
        }
        self.camps.get(&key)
    }

    /// Tears down the camp of `key` and releases its reservations.
    ///
    /// The returned runtime lets the caller hand structures back to the
    /// object view.
    pub fn deactivate(&mut self, key: ChunkKey, reservations: &mut ReservationMap) -> Option<CampRuntime> {
        let camp = self.camps.remove(&key)?;
        CampPlanner::release(&camp, reservations);
        Some(camp)
    }

    /// Camp of an active chunk.
    #[must_use]
    pub fn get(&self, key: ChunkKey) -> Option<&CampRuntime> {
        self.camps.get(&key)
    }

    /// Mutable camp of an active chunk, for applying edits.
    pub fn get_mut(&mut self, key: ChunkKey) -> Option<&mut CampRuntime> {
        self.camps.get_mut(&key)
    }

    /// Active camps in chunk-key order.
    pub fn iter(&self) -> impl Iterator<Item = &CampRuntime> {
        self.camps.values()
    }

    /// Planned NPCs of all active camps standing inside `rect`.
    #[must_use]
    pub fn planned_npcs_in(&self, rect: &CellRect) -> Vec<PlannedUnit> {
        let mut out = Vec::new();
        for camp in self.camps.values() {
            wildmere_shared::collect_in_rect(&camp.npcs, rect, &mut out);
        }
        out
    }

    /// Number of active camps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.camps.len()
    }

    /// Returns true if no camp is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.camps.is_empty()
    }

    /// Releases every camp. Used on full regeneration.
    pub fn clear(&mut self, reservations: &mut ReservationMap) -> Vec<CampRuntime> {
        let camps: Vec<CampRuntime> = std::mem::take(&mut self.camps).into_values().collect();
        for camp in &camps {
            CampPlanner::release(camp, reservations);
        }
        camps
    }
}
