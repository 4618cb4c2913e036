//! # Object Streaming
//!
//! Plans vegetation and props for chunks entering the active region,
//! re-applies their stored delta, and keeps the delta current while the
//! chunk is active.
//!
//! Camp structures share the chunk's delta in the store but are edited by
//! the camp controller; this controller only touches plain indices.

use std::collections::BTreeMap;

use tracing::debug;
use wildmere_procedural::{
    BiomeLayer, ChunkDelta, DeltaStatus, DeltaStore, ObjectInstance, ObjectPlanner, ReservationMap,
    CAMP_INDEX_BIT,
};
use wildmere_shared::{ChunkKey, InstanceId, ObjectKind, Vec2};

use super::{ChunkStreamer, StreamStats, StreamerSettings, Transition};
use crate::collaborators::{ObjectOwner, ObjectView};

/// Returns true for ids owned by this controller.
#[must_use]
pub const fn is_plain_index(index: u32) -> bool {
    index & CAMP_INDEX_BIT == 0
}

/// Edit applied to a placed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectEdit {
    /// Remove the object.
    Destroy,
    /// Change its type.
    Transform(ObjectKind),
}

impl ObjectEdit {
    fn record(self, delta: &mut ChunkDelta, index: u32) {
        match self {
            Self::Destroy => delta.record_destroyed(index),
            Self::Transform(kind) => delta.record_transformed(index, kind),
        }
    }
}

/// Writes an edit of an inactive chunk straight to the store.
pub fn record_offline(store: &mut dyn DeltaStore, id: InstanceId, edit: ObjectEdit) {
    let mut delta = store.load(id.chunk).unwrap_or_else(|| ChunkDelta::new(id.chunk));
    edit.record(&mut delta, id.index);
    store.store(delta, DeltaStatus::Changed);
}

/// Stores `live` on top of whatever the store holds for its chunk.
pub(crate) fn flush_delta(store: &mut dyn DeltaStore, live: ChunkDelta, changed: bool) {
    if !changed {
        store.store(live, DeltaStatus::Unchanged);
        return;
    }
    let mut stored = store.load(live.chunk).unwrap_or_else(|| ChunkDelta::new(live.chunk));
    stored.merge(&live);
    store.store(stored, DeltaStatus::Changed);
}

#[derive(Debug)]
struct LiveChunk {
    objects: Vec<ObjectInstance>,
    delta: ChunkDelta,
    changed: bool,
}

/// Streams planned objects to an `ObjectView`.
#[derive(Debug)]
pub struct ObjectController {
    streamer: ChunkStreamer,
    planner: ObjectPlanner,
    live: BTreeMap<ChunkKey, LiveChunk>,
}

impl ObjectController {
    /// Creates an idle controller. The streamer grid must match the
    /// planner's chunk size.
    #[must_use]
    pub fn new(settings: StreamerSettings, planner: ObjectPlanner) -> Self {
        let settings = StreamerSettings {
            chunk_size: planner.chunk_size(),
            ..settings
        };
        Self {
            streamer: ChunkStreamer::new(settings),
            planner,
            live: BTreeMap::new(),
        }
    }

    /// Streams around the observer.
    pub fn update(
        &mut self,
        observer: Vec2,
        biomes: &BiomeLayer,
        reservations: &ReservationMap,
        view: &mut dyn ObjectView,
        store: &mut dyn DeltaStore,
    ) -> Transition {
        let delta = self.streamer.update(observer);
        for &key in &delta.to_unload {
            self.release(key, view, store);
        }
        for &key in &delta.to_load {
            self.materialize(key, biomes, reservations, view, store);
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
        reservations: &ReservationMap,
        view: &mut dyn ObjectView,
        store: &dyn DeltaStore,
    ) {
        let mut objects = self.planner.plan_chunk(key, biomes, reservations);
        let delta = store
            .load(key)
            .map_or_else(|| ChunkDelta::new(key), |stored| stored.filtered(is_plain_index));
        let edited = delta.apply(&mut objects);
        debug!(
            "Object chunk {} materialized: {} objects, {} edited",
            key,
            objects.len(),
            edited
        );
        view.show(ObjectOwner::Chunk(key), &objects);
        self.live.insert(
            key,
            LiveChunk {
                objects,
                delta,
                changed: false,
            },
        );
    }

    fn release(&mut self, key: ChunkKey, view: &mut dyn ObjectView, store: &mut dyn DeltaStore) {
        let Some(chunk) = self.live.remove(&key) else { return };
        debug!(
            "Object chunk {} released ({})",
            key,
            if chunk.changed { "changed" } else { "unchanged" }
        );
        view.hide(ObjectOwner::Chunk(key));
        flush_delta(store, chunk.delta, chunk.changed);
    }

    /// Applies an edit. Active chunks update their view and delta; edits of
    /// inactive chunks go straight to the store.
    ///
    /// Returns true if a live object was affected.
    pub fn edit(
        &mut self,
        id: InstanceId,
        edit: ObjectEdit,
        view: &mut dyn ObjectView,
        store: &mut dyn DeltaStore,
    ) -> bool {
        let Some(chunk) = self.live.get_mut(&id.chunk) else {
            record_offline(store, id, edit);
            return false;
        };
        edit.record(&mut chunk.delta, id.index);
        chunk.changed = true;

        let Some(position) = chunk.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        match edit {
            ObjectEdit::Destroy => {
                chunk.objects.remove(position);
                view.object_removed(id);
            }
            ObjectEdit::Transform(kind) => {
                let object = &mut chunk.objects[position];
                object.kind = kind;
                view.object_changed(object);
            }
        }
        true
    }

    /// Releases every active chunk, flushing deltas.
    pub fn clear(&mut self, view: &mut dyn ObjectView, store: &mut dyn DeltaStore) -> usize {
        let released = self.streamer.reset();
        for &key in &released {
            self.release(key, view, store);
        }
        released.len()
    }

    /// Objects of an active chunk.
    #[must_use]
    pub fn objects(&self, key: ChunkKey) -> Option<&[ObjectInstance]> {
        self.live.get(&key).map(|chunk| chunk.objects.as_slice())
    }

    /// Number of live objects across active chunks.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.live.values().map(|chunk| chunk.objects.len()).sum()
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
    use wildmere_procedural::config::{BiomeChanceDef, BiomeDef, ClimateZoneDef};
    use wildmere_procedural::{
        ClimateConfig, InMemoryDeltaStore, PlacementMode, PlacementRuleDef, WorldConfig, WorldContext,
    };

    fn plains_world() -> WorldContext {
        let config = WorldConfig {
            half_extent: [96, 96],
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
                color: [1, 2, 3],
            }],
            placement: vec![PlacementRuleDef {
                biome: "plains".into(),
                kind: 3,
                target_per_chunk: 12,
                mode: PlacementMode::Uniform,
                ..PlacementRuleDef::default()
            }],
            ..WorldConfig::default()
        };
        let mut ctx = WorldContext::new(config).unwrap();
        ctx.build_all().unwrap();
        ctx
    }

    fn controller(ctx: &WorldContext) -> ObjectController {
        let settings = StreamerSettings {
            load_radius: 1.0,
            keep_radius: 1.0,
            chunk_size: 64,
            cell_size: 1.0,
        };
        ObjectController::new(settings, ctx.object_planner().unwrap())
    }

    #[test]
    fn test_destroy_survives_reload() {
        let ctx = plains_world();
        let mut objects = controller(&ctx);
        let mut store = InMemoryDeltaStore::new();
        let mut view = NullCollaborator;
        let key = ChunkKey::pack(0, 0);

        objects.update(Vec2::new(32.0, 32.0), ctx.biomes().unwrap(), ctx.reservations(), &mut view, &mut store);
        let first = objects.objects(key).unwrap().to_vec();
        assert!(first.len() > 1);
        let victim = first[0].id;
        let changed = first[1].id;

        assert!(objects.edit(victim, ObjectEdit::Destroy, &mut view, &mut store));
        assert!(objects.edit(changed, ObjectEdit::Transform(ObjectKind(99)), &mut view, &mut store));
        assert!(store.is_empty(), "Edits of active chunks wait for release");

        // Walk away, then back.
        objects.update(Vec2::new(32.0, 500.0), ctx.biomes().unwrap(), ctx.reservations(), &mut view, &mut store);
        assert!(objects.objects(key).is_none());
        assert_eq!(store.writes(), 1);

        objects.update(Vec2::new(32.0, 32.0), ctx.biomes().unwrap(), ctx.reservations(), &mut view, &mut store);
        let second = objects.objects(key).unwrap();
        assert_eq!(second.len(), first.len() - 1);
        assert!(second.iter().all(|o| o.id != victim));
        assert_eq!(second.iter().find(|o| o.id == changed).unwrap().kind, ObjectKind(99));
    }

    #[test]
    fn test_offline_edit_applies_on_load() {
        let ctx = plains_world();
        let mut objects = controller(&ctx);
        let mut store = InMemoryDeltaStore::new();
        let mut view = NullCollaborator;
        let key = ChunkKey::pack(1, 0);
        let planned = ctx
            .object_planner()
            .unwrap()
            .plan_chunk(key, ctx.biomes().unwrap(), ctx.reservations());
        let victim = planned[0].id;

        assert!(!objects.edit(victim, ObjectEdit::Destroy, &mut view, &mut store));
        assert_eq!(store.len(), 1);

        objects.update(Vec2::new(96.0, 32.0), ctx.biomes().unwrap(), ctx.reservations(), &mut view, &mut store);
        let loaded = objects.objects(key).unwrap();
        assert_eq!(loaded.len(), planned.len() - 1);
    }

    #[test]
    fn test_unchanged_release_writes_nothing() {
        let ctx = plains_world();
        let mut objects = controller(&ctx);
        let mut store = InMemoryDeltaStore::new();
        let mut view = NullCollaborator;

        objects.update(Vec2::new(32.0, 32.0), ctx.biomes().unwrap(), ctx.reservations(), &mut view, &mut store);
        assert!(objects.clear(&mut view, &mut store) > 0);
        assert_eq!(store.writes(), 0);
        assert_eq!(objects.object_count(), 0);
    }

    #[test]
    fn test_flush_preserves_camp_entries() {
        let key = ChunkKey::pack(0, 0);
        let mut store = InMemoryDeltaStore::new();
        let mut stored = ChunkDelta::new(key);
        stored.record_destroyed(CAMP_INDEX_BIT | 2);
        store.store(stored, DeltaStatus::Changed);

        let mut live = store.load(key).unwrap().filtered(is_plain_index);
        live.record_destroyed(4);
        flush_delta(&mut store, live, true);

        let merged = store.load(key).unwrap();
        assert!(merged.get(CAMP_INDEX_BIT | 2).is_some());
        assert!(merged.get(4).is_some());
    }
}
