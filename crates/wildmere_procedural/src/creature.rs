//! # Creature Group Planner
//!
//! Scatters creature groups over a chunk by testing a fixed step grid of
//! candidate cells. Each candidate draws from its own cell-keyed stream, so
//! rejecting one candidate never shifts the rolls of the next.
//!
//! Group spacing is checked against groups already planned in the active
//! region. That part depends on which neighbors are loaded.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use rand::Rng;
use tracing::{debug, warn};
use wildmere_shared::{
    BiomeId, Cell, CellRect, ChunkKey, GroupId, PlannedUnit, ProfileId, UnitId, UnitOwner,
};

use crate::biome::{BiomeCatalog, BiomeLayer};
use crate::config::{CreatureRuleDef, GroupDef, WorldConfig};
use crate::noise::{cell_key, hash_key, keyed_rng, mix64, WorldSeed};
use crate::reservation::{ReservationMap, ReservationMask};

const GROUP_SALT: u64 = 0x6E_0A9;
const MEMBER_SALT: u64 = 0x3E_3BE2;

/// A planned creature group.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureGroup {
    /// Group identity.
    pub id: GroupId,
    /// Chunk that planned it.
    pub chunk: ChunkKey,
    /// Anchor cell.
    pub anchor: Cell,
    /// Group profile.
    pub profile: ProfileId,
    /// Planned members.
    pub members: Vec<PlannedUnit>,
}

/// Resolved creature table.
#[derive(Clone, Debug)]
pub struct CreatureRule {
    /// Spawn probability per candidate.
    pub density: f64,
    /// Weighted group profiles.
    pub groups: Vec<GroupDef>,
    total_weight: u32,
}

impl CreatureRule {
    fn from_def(def: &CreatureRuleDef) -> Self {
        Self {
            density: def.density.clamp(0.0, 1.0),
            groups: def.groups.clone(),
            total_weight: def.groups.iter().map(|g| g.weight).sum(),
        }
    }

    /// Picks a group for a roll in `0..total_weight`.
    #[must_use]
    pub fn pick(&self, roll: u32) -> Option<&GroupDef> {
        let mut cumulative = 0;
        for group in &self.groups {
            cumulative += group.weight;
            if roll < cumulative {
                return Some(group);
            }
        }
        None
    }

    /// Sum of group weights.
    #[must_use]
    pub const fn total_weight(&self) -> u32 {
        self.total_weight
    }
}

/// Deterministic per-chunk creature planner.
#[derive(Clone, Debug)]
pub struct CreaturePlanner {
    seed: WorldSeed,
    salt: u64,
    chunk_size: u32,
    step: u32,
    min_group_distance: f32,
    avoid_mask: ReservationMask,
    rules: HashMap<BiomeId, CreatureRule>,
    fallback: Option<CreatureRule>,
}

impl CreaturePlanner {
    /// Resolves the creature tables; unknown biomes are skipped with a warning.
    #[must_use]
    pub fn new(config: &WorldConfig, catalog: &BiomeCatalog, seed: WorldSeed) -> Self {
        let creatures = &config.creatures;
        let mut rules = HashMap::new();
        for def in &creatures.rules {
            match catalog.id(&def.biome) {
                Some(biome) => {
                    rules.insert(biome, CreatureRule::from_def(def));
                }
                None => warn!("Creature rule skipped: unknown biome '{}'", def.biome),
            }
        }

        Self {
            seed,
            salt: creatures.salt,
            chunk_size: config.chunk_size,
            step: creatures.step.max(1),
            min_group_distance: creatures.min_group_distance,
            avoid_mask: creatures.avoid_mask,
            rules,
            fallback: creatures.fallback.as_ref().map(CreatureRule::from_def),
        }
    }

    /// Rule for a biome, or the fallback.
    #[must_use]
    pub fn rule_for(&self, biome: BiomeId) -> Option<&CreatureRule> {
        self.rules.get(&biome).or(self.fallback.as_ref())
    }

    /// Chunk size in cells.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Chunk radius within which groups can be too close.
    #[must_use]
    pub fn neighbor_radius(&self) -> i32 {
        (self.min_group_distance.max(0.0) / self.chunk_size as f32).ceil() as i32
    }

    /// Plans the groups of one chunk.
    ///
    /// `nearby` holds the anchors of groups already planned around it.
    #[must_use]
    pub fn plan_chunk(
        &self,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &ReservationMap,
        nearby: &[Cell],
    ) -> Vec<CreatureGroup> {
        let origin = key.coord().origin(self.chunk_size);
        let min_sq = f64::from(self.min_group_distance) * f64::from(self.min_group_distance);
        let half_step = (self.step / 2) as i32;
        let mut anchors: Vec<Cell> = nearby.to_vec();
        let mut groups = Vec::new();

        for gy in (0..self.chunk_size).step_by(self.step as usize) {
            for gx in (0..self.chunk_size).step_by(self.step as usize) {
                let cell = origin.offset(gx as i32 + half_step, gy as i32 + half_step);
                if cell.x >= origin.x + self.chunk_size as i32 || cell.y >= origin.y + self.chunk_size as i32 {
                    continue;
                }
                let Some(biome) = biomes.biome_at(cell) else { continue };
                let Some(rule) = self.rule_for(biome) else { continue };

                let mut rng = keyed_rng(self.seed, cell_key(cell), self.salt);
                if rng.gen::<f64>() >= rule.density {
                    continue;
                }
                if reservations.is_reserved(cell, self.avoid_mask) {
                    continue;
                }
                if anchors
                    .iter()
                    .any(|other| (other.distance_squared(cell) as f64) < min_sq)
                {
                    continue;
                }
                if rule.total_weight() == 0 {
                    continue;
                }
                let Some(profile) = rule.pick(rng.gen_range(0..rule.total_weight())) else {
                    continue;
                };

                let group = self.expand(key, cell, profile, reservations, &mut rng);
                if group.members.is_empty() {
                    continue;
                }
                anchors.push(cell);
                groups.push(group);
            }
        }
        groups
    }

    fn expand(
        &self,
        key: ChunkKey,
        anchor: Cell,
        profile: &GroupDef,
        reservations: &ReservationMap,
        rng: &mut rand_chacha::ChaCha8Rng,
    ) -> CreatureGroup {
        let id = GroupId(hash_key(self.seed, cell_key(anchor), self.salt ^ GROUP_SALT));
        let owner = UnitOwner::Group(id);

        let counts: Vec<u32> = profile
            .members
            .iter()
            .map(|m| rng.gen_range(m.count[0]..=m.count[1].max(m.count[0])))
            .collect();
        let total: u32 = counts.iter().sum();
        let phase = rng.gen::<f32>() * TAU;
        let jitter = profile.jitter.max(0.0);

        let mut members = Vec::with_capacity(total as usize);
        let mut slot = 0u32;
        for (member, count) in profile.members.iter().zip(counts) {
            for _ in 0..count {
                let member_slot = slot;
                let angle = phase + TAU * member_slot as f32 / total.max(1) as f32;
                slot += 1;
                let (jx, jy) = if jitter > 0.0 {
                    (rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter))
                } else {
                    (0.0, 0.0)
                };
                let cell = anchor.offset(
                    (angle.cos() * profile.cohesion_radius + jx).round() as i32,
                    (angle.sin() * profile.cohesion_radius + jy).round() as i32,
                );
                if reservations.is_reserved(cell, self.avoid_mask) {
                    continue;
                }
                // Slot is unique within the group, even for repeated profiles
                let identity = mix64(u64::from(member.profile) ^ MEMBER_SALT) ^ u64::from(member_slot);
                members.push(PlannedUnit {
                    id: UnitId(hash_key(self.seed, cell_key(anchor), identity)),
                    cell,
                    profile: ProfileId(member.profile),
                    owner,
                });
            }
        }

        CreatureGroup {
            id,
            chunk: key,
            anchor,
            profile: ProfileId(profile.profile),
            members,
        }
    }
}

/// Groups of the currently active chunks.
#[derive(Debug, Default)]
pub struct ActiveGroups {
    chunks: BTreeMap<ChunkKey, Vec<CreatureGroup>>,
}

impl ActiveGroups {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans and stores the groups of `key`. Returns the new groups.
    pub fn activate(
        &mut self,
        planner: &CreaturePlanner,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &ReservationMap,
    ) -> &[CreatureGroup] {
        if !self.chunks.contains_key(&key) {
            let nearby = self.anchors_near(key, planner.neighbor_radius());
            let groups = planner.plan_chunk(key, biomes, reservations, &nearby);
            debug!("Creature chunk {} planned {} groups", key, groups.len());
            self.chunks.insert(key, groups);
        }
        self.chunks.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn anchors_near(&self, key: ChunkKey, radius: i32) -> Vec<Cell> {
        let center = key.coord();
        let mut anchors = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if let Some(groups) = self.chunks.get(&ChunkKey::pack(center.x + dx, center.y + dy)) {
                    anchors.extend(groups.iter().map(|g| g.anchor));
                }
            }
        }
        anchors
    }

    /// Drops the groups of `key`.
    pub fn deactivate(&mut self, key: ChunkKey) -> Option<Vec<CreatureGroup>> {
        self.chunks.remove(&key)
    }

    /// Groups of an active chunk.
    #[must_use]
    pub fn get(&self, key: ChunkKey) -> Option<&[CreatureGroup]> {
        self.chunks.get(&key).map(Vec::as_slice)
    }

    /// All active groups in chunk-key order.
    pub fn iter(&self) -> impl Iterator<Item = &CreatureGroup> {
        self.chunks.values().flatten()
    }

    /// Planned members of all active groups standing inside `rect`.
    #[must_use]
    pub fn planned_units_in(&self, rect: &CellRect) -> Vec<PlannedUnit> {
        let mut out = Vec::new();
        for group in self.iter() {
            wildmere_shared::collect_in_rect(&group.members, rect, &mut out);
        }
        out
    }

    /// Number of active chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Drops everything. Used on full regeneration.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
