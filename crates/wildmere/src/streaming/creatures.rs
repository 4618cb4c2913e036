//! # Creature Streaming
//!
//! Plans creature groups for chunks entering the active region and hands
//! their members to the unit spawner. Groups are planned after camps in
//! the same tick, so camp ground is already reserved.

use tracing::debug;
use wildmere_procedural::{ActiveGroups, BiomeLayer, CreaturePlanner, ReservationMap};
use wildmere_shared::{CellRect, PlannedUnit, UnitId, Vec2};

use super::{ChunkStreamer, StreamStats, StreamerSettings, Transition};
use crate::collaborators::UnitSpawner;

/// Streams creature groups to a `UnitSpawner`.
#[derive(Debug)]
pub struct CreatureController {
    streamer: ChunkStreamer,
    planner: CreaturePlanner,
    groups: ActiveGroups,
}

impl CreatureController {
    /// Creates an idle controller on the planner's chunk grid.
    #[must_use]
    pub fn new(settings: StreamerSettings, planner: CreaturePlanner) -> Self {
        let settings = StreamerSettings {
            chunk_size: planner.chunk_size(),
            ..settings
        };
        Self {
            streamer: ChunkStreamer::new(settings),
            planner,
            groups: ActiveGroups::new(),
        }
    }

    /// Streams around the observer.
    pub fn update(
        &mut self,
        observer: Vec2,
        biomes: &BiomeLayer,
        reservations: &ReservationMap,
        units: &mut dyn UnitSpawner,
    ) -> Transition {
        let delta = self.streamer.update(observer);
        for &key in &delta.to_unload {
            if let Some(groups) = self.groups.deactivate(key) {
                let ids: Vec<UnitId> = groups.iter().flat_map(|g| g.members.iter().map(|m| m.id)).collect();
                debug!("Creature chunk {} released: {} units", key, ids.len());
                units.despawn(&ids);
            }
        }
        for &key in &delta.to_load {
            let groups = self.groups.activate(&self.planner, key, biomes, reservations);
            let members: Vec<PlannedUnit> = groups.iter().flat_map(|g| g.members.iter().copied()).collect();
            if !members.is_empty() {
                units.spawn(&members);
            }
        }
        Transition {
            loaded: delta.to_load.len(),
            released: delta.to_unload.len(),
        }
    }

    /// Drops every group and despawns its members.
    pub fn clear(&mut self, units: &mut dyn UnitSpawner) -> usize {
        let ids: Vec<UnitId> = self
            .groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| m.id))
            .collect();
        if !ids.is_empty() {
            units.despawn(&ids);
        }
        self.groups.clear();
        self.streamer.reset().len()
    }

    /// Planned members of active groups inside `rect`.
    #[must_use]
    pub fn planned_units_in(&self, rect: &CellRect) -> Vec<PlannedUnit> {
        self.groups.planned_units_in(rect)
    }

    /// Active groups.
    #[must_use]
    pub const fn groups(&self) -> &ActiveGroups {
        &self.groups
    }

    /// The underlying streamer.
    #[must_use]
    pub const fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> StreamStats {
        self.streamer.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wildmere_procedural::{WorldConfig, WorldContext};

    #[derive(Default)]
    struct Census {
        alive: HashSet<UnitId>,
        spawned: usize,
    }

    impl UnitSpawner for Census {
        fn spawn(&mut self, units: &[PlannedUnit]) {
            for unit in units {
                assert!(self.alive.insert(unit.id), "Unit {:?} spawned twice", unit.id);
            }
            self.spawned += units.len();
        }

        fn despawn(&mut self, ids: &[UnitId]) {
            for id in ids {
                assert!(self.alive.remove(id), "Unit {id:?} despawned but never spawned");
            }
        }
    }

    #[test]
    fn test_spawn_despawn_balance() {
        let mut ctx = WorldContext::new(WorldConfig::default()).unwrap();
        ctx.build_all().unwrap();
        let settings = StreamerSettings {
            load_radius: 96.0,
            keep_radius: 128.0,
            chunk_size: 64,
            cell_size: 1.0,
        };
        let mut creatures = CreatureController::new(settings, ctx.creature_planner().unwrap());
        let mut census = Census::default();

        for step in 0..40 {
            let observer = Vec2::new(step as f32 * 16.0 - 320.0, 0.0);
            creatures.update(observer, ctx.biomes().unwrap(), ctx.reservations(), &mut census);
        }
        assert!(census.spawned > 0, "Walk through the default world spawned nothing");

        let active: usize = creatures.groups().iter().map(|g| g.members.len()).sum();
        assert_eq!(census.alive.len(), active);

        creatures.clear(&mut census);
        assert!(census.alive.is_empty());
    }
}
