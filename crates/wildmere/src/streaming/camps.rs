//! # Camp Streaming
//!
//! Activates camps as their chunks enter the active region. Activation
//! reserves the camp's ground before objects and creatures of the same
//! tick are planned; release frees exactly what was reserved.
//!
//! Structures go to the object view, NPC slots to the unit spawner.

use std::collections::BTreeMap;

use tracing::debug;
use wildmere_procedural::{
    ActiveCamps, BiomeLayer, CampPlanner, CampRuntime, ChunkDelta, DeltaStore, ObjectInstance,
    ReservationMap,
};
use wildmere_shared::{CellRect, ChunkKey, InstanceId, PlannedUnit, UnitId, Vec2};

use super::objects::{flush_delta, is_plain_index, record_offline, ObjectEdit};
use super::{ChunkStreamer, StreamStats, StreamerSettings, Transition};
use crate::collaborators::{ObjectOwner, ObjectView, UnitSpawner};

fn apply_to_structures(delta: &ChunkDelta, camp: &mut CampRuntime) {
    camp.structures
        .retain(|s| !delta.get(s.instance.id.index).is_some_and(|entry| entry.destroyed));
    for structure in &mut camp.structures {
        if let Some(kind) = delta.get(structure.instance.id.index).and_then(|entry| entry.new_kind) {
            structure.instance.kind = kind;
        }
    }
}

fn structure_instances(camp: &CampRuntime) -> Vec<ObjectInstance> {
    camp.structures.iter().map(|s| s.instance).collect()
}

fn npc_ids(camp: &CampRuntime) -> Vec<UnitId> {
    camp.npcs.iter().map(|npc| npc.id).collect()
}

/// Streams camps to the object view and unit spawner.
#[derive(Debug)]
pub struct CampController {
    streamer: ChunkStreamer,
    planner: CampPlanner,
    camps: ActiveCamps,
    deltas: BTreeMap<ChunkKey, (ChunkDelta, bool)>,
}

impl CampController {
    /// Creates an idle controller on the planner's chunk grid.
    #[must_use]
    pub fn new(settings: StreamerSettings, planner: CampPlanner) -> Self {
        let settings = StreamerSettings {
            chunk_size: planner.chunk_size(),
            ..settings
        };
        Self {
            streamer: ChunkStreamer::new(settings),
            planner,
            camps: ActiveCamps::new(),
            deltas: BTreeMap::new(),
        }
    }

    /// Streams around the observer.
    pub fn update(
        &mut self,
        observer: Vec2,
        biomes: &BiomeLayer,
        reservations: &mut ReservationMap,
        view: &mut dyn ObjectView,
        units: &mut dyn UnitSpawner,
        store: &mut dyn DeltaStore,
    ) -> Transition {
        let delta = self.streamer.update(observer);
        for &key in &delta.to_unload {
            self.release(key, reservations, view, units, store);
        }
        for &key in &delta.to_load {
            self.materialize(key, biomes, reservations, view, units, store);
        }
        Transition {
            loaded: delta.to_load.len(),
            released: delta.to_unload.len(),
        }
    }

    fn materialize(
        &mut self,
        key: ChunkKey,
        biomes: &BiomeLayer,
        reservations: &mut ReservationMap,
        view: &mut dyn ObjectView,
        units: &mut dyn UnitSpawner,
        store: &dyn DeltaStore,
    ) {
        if self.camps.activate(&self.planner, key, biomes, reservations).is_none() {
            return;
        }
        let Some(camp) = self.camps.get_mut(key) else { return };

        let delta = store
            .load(key)
            .map_or_else(|| ChunkDelta::new(key), |stored| stored.filtered(|i| !is_plain_index(i)));
        apply_to_structures(&delta, camp);

        view.show(ObjectOwner::Camp(camp.id), &structure_instances(camp));
        units.spawn(&camp.npcs);
        self.deltas.insert(key, (delta, false));
    }

    fn release(
        &mut self,
        key: ChunkKey,
        reservations: &mut ReservationMap,
        view: &mut dyn ObjectView,
        units: &mut dyn UnitSpawner,
        store: &mut dyn DeltaStore,
    ) {
        let Some(camp) = self.camps.deactivate(key, reservations) else { return };
        debug!("Camp in chunk {} released", key);
        view.hide(ObjectOwner::Camp(camp.id));
        units.despawn(&npc_ids(&camp));
        if let Some((delta, changed)) = self.deltas.remove(&key) {
            flush_delta(store, delta, changed);
        }
    }

    /// Applies an edit to a camp structure. Edits of inactive camps go
    /// straight to the store.
    ///
    /// Returns true if a live structure was affected.
    pub fn edit(
        &mut self,
        id: InstanceId,
        edit: ObjectEdit,
        view: &mut dyn ObjectView,
        store: &mut dyn DeltaStore,
    ) -> bool {
        let (Some(camp), Some((delta, changed))) = (self.camps.get_mut(id.chunk), self.deltas.get_mut(&id.chunk))
        else {
            record_offline(store, id, edit);
            return false;
        };
        match edit {
            ObjectEdit::Destroy => delta.record_destroyed(id.index),
            ObjectEdit::Transform(kind) => delta.record_transformed(id.index, kind),
        }
        *changed = true;

        let Some(position) = camp.structures.iter().position(|s| s.instance.id == id) else {
            return false;
        };
        match edit {
            ObjectEdit::Destroy => {
                camp.structures.remove(position);
                view.object_removed(id);
            }
            ObjectEdit::Transform(kind) => {
                let instance = &mut camp.structures[position].instance;
                instance.kind = kind;
                view.object_changed(instance);
            }
        }
        true
    }

    /// Releases every camp and its reservations.
    pub fn clear(
        &mut self,
        reservations: &mut ReservationMap,
        view: &mut dyn ObjectView,
        units: &mut dyn UnitSpawner,
        store: &mut dyn DeltaStore,
    ) -> usize {
        let released = self.streamer.reset();
        for &key in &released {
            self.release(key, reservations, view, units, store);
        }
        released.len()
    }

    /// Planned NPCs of active camps inside `rect`.
    #[must_use]
    pub fn planned_npcs_in(&self, rect: &CellRect) -> Vec<PlannedUnit> {
        self.camps.planned_npcs_in(rect)
    }

    /// Active camps.
    #[must_use]
    pub const fn camps(&self) -> &ActiveCamps {
        &self.camps
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
    use crate::collaborators::NullCollaborator;
    use wildmere_procedural::{InMemoryDeltaStore, WorldConfig, WorldContext};

    fn ready() -> WorldContext {
        let mut ctx = WorldContext::new(WorldConfig::default()).unwrap();
        ctx.build_all().unwrap();
        ctx
    }

    fn wide(ctx: &WorldContext) -> CampController {
        let settings = StreamerSettings {
            load_radius: 200.0,
            keep_radius: 260.0,
            chunk_size: 64,
            cell_size: 1.0,
        };
        CampController::new(settings, ctx.camp_planner().unwrap())
    }

    #[test]
    fn test_release_frees_reservations() {
        let mut ctx = ready();
        let mut camps = wide(&ctx);
        let mut store = InMemoryDeltaStore::new();
        let mut sink = NullCollaborator;
        let mut units = NullCollaborator;

        let (biomes, reservations) = ctx.planning_view("test").unwrap();
        camps.update(Vec2::ZERO, biomes, reservations, &mut sink, &mut units, &mut store);
        assert!(!camps.camps().is_empty(), "Default world has camps near the origin");
        assert!(!reservations.is_empty());

        camps.clear(reservations, &mut sink, &mut units, &mut store);
        assert!(reservations.is_empty(), "Released camps left reservations behind");
        assert!(camps.camps().is_empty());
    }

    #[test]
    fn test_structure_edit_survives_reload() {
        let mut ctx = ready();
        let mut camps = wide(&ctx);
        let mut store = InMemoryDeltaStore::new();
        let mut view = NullCollaborator;
        let mut units = NullCollaborator;

        {
            let (biomes, reservations) = ctx.planning_view("test").unwrap();
            camps.update(Vec2::ZERO, biomes, reservations, &mut view, &mut units, &mut store);
        }
        let camp = camps
            .camps()
            .iter()
            .find(|c| !c.structures.is_empty())
            .expect("default world has a camp with structures near the origin");
        let key = camp.id.0;
        let victim = camp.structures[0].instance.id;
        let before = camp.structures.len();

        assert!(camps.edit(victim, ObjectEdit::Destroy, &mut view, &mut store));
        {
            let (biomes, reservations) = ctx.planning_view("test").unwrap();
            camps.clear(reservations, &mut view, &mut units, &mut store);
            camps.update(Vec2::ZERO, biomes, reservations, &mut view, &mut units, &mut store);
        }
        let reloaded = camps.camps().get(key).unwrap();
        assert_eq!(reloaded.structures.len(), before - 1);
        assert!(reloaded.structures.iter().all(|s| s.instance.id != victim));
    }
}
