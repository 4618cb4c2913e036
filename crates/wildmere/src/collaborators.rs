//! # Collaborators
//!
//! The runtime produces records; collaborators turn them into something
//! visible. They are handed in at construction through
//! `CollaboratorsBuilder`. A missing collaborator is a configuration
//! defect, not a failure: it is logged and replaced by a null sink.

use tracing::warn;
use wildmere_procedural::{DeltaStore, InMemoryDeltaStore, ObjectInstance};
use wildmere_shared::{CampId, ChunkKey, InstanceId, PlannedUnit, UnitId};

use crate::streaming::tiles::TileChunk;

/// Who owns a batch of objects handed to the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectOwner {
    /// Vegetation and props of a chunk.
    Chunk(ChunkKey),
    /// Structures of a camp.
    Camp(CampId),
}

/// Receives biome tiles.
pub trait TileSink {
    /// A tile chunk entered the active region.
    fn tiles_loaded(&mut self, chunk: &TileChunk);
    /// A tile chunk left the active region.
    fn tiles_released(&mut self, key: ChunkKey);
}

/// Pools and shows placed objects.
pub trait ObjectView {
    /// A batch of objects should become visible.
    fn show(&mut self, owner: ObjectOwner, objects: &[ObjectInstance]);
    /// Every object of `owner` should disappear.
    fn hide(&mut self, owner: ObjectOwner);
    /// One visible object was destroyed.
    fn object_removed(&mut self, id: InstanceId);
    /// One visible object changed type.
    fn object_changed(&mut self, object: &ObjectInstance);
}

/// Spawns planned creatures and NPCs.
pub trait UnitSpawner {
    /// Planned units entered the active region.
    fn spawn(&mut self, units: &[PlannedUnit]);
    /// Units left the active region.
    fn despawn(&mut self, ids: &[UnitId]);
}

/// Collaborator that drops everything it receives.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCollaborator;

impl TileSink for NullCollaborator {
    fn tiles_loaded(&mut self, _chunk: &TileChunk) {}
    fn tiles_released(&mut self, _key: ChunkKey) {}
}

impl ObjectView for NullCollaborator {
    fn show(&mut self, _owner: ObjectOwner, _objects: &[ObjectInstance]) {}
    fn hide(&mut self, _owner: ObjectOwner) {}
    fn object_removed(&mut self, _id: InstanceId) {}
    fn object_changed(&mut self, _object: &ObjectInstance) {}
}

impl UnitSpawner for NullCollaborator {
    fn spawn(&mut self, _units: &[PlannedUnit]) {}
    fn despawn(&mut self, _ids: &[UnitId]) {}
}

/// Everything the runtime talks to.
pub struct Collaborators {
    /// Tile consumer.
    pub tiles: Box<dyn TileSink>,
    /// Object pool.
    pub objects: Box<dyn ObjectView>,
    /// Creature and NPC spawner.
    pub units: Box<dyn UnitSpawner>,
    /// Chunk delta persistence.
    pub deltas: Box<dyn DeltaStore>,
}

impl Collaborators {
    /// Null sinks and an in-memory delta store. Useful for headless runs.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            tiles: Box::new(NullCollaborator),
            objects: Box::new(NullCollaborator),
            units: Box::new(NullCollaborator),
            deltas: Box::new(InMemoryDeltaStore::new()),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> CollaboratorsBuilder {
        CollaboratorsBuilder::default()
    }
}

/// Builder for `Collaborators`.
#[derive(Default)]
pub struct CollaboratorsBuilder {
    tiles: Option<Box<dyn TileSink>>,
    objects: Option<Box<dyn ObjectView>>,
    units: Option<Box<dyn UnitSpawner>>,
    deltas: Option<Box<dyn DeltaStore>>,
}

impl CollaboratorsBuilder {
    /// Sets the tile sink.
    #[must_use]
    pub fn tiles(mut self, sink: impl TileSink + 'static) -> Self {
        self.tiles = Some(Box::new(sink));
        self
    }

    /// Sets the object view.
    #[must_use]
    pub fn objects(mut self, view: impl ObjectView + 'static) -> Self {
        self.objects = Some(Box::new(view));
        self
    }

    /// Sets the unit spawner.
    #[must_use]
    pub fn units(mut self, spawner: impl UnitSpawner + 'static) -> Self {
        self.units = Some(Box::new(spawner));
        self
    }

    /// Sets the delta store.
    #[must_use]
    pub fn deltas(mut self, store: impl DeltaStore + 'static) -> Self {
        self.deltas = Some(Box::new(store));
        self
    }

    /// Builds the set, substituting null sinks for anything missing.
    #[must_use]
    pub fn build(self) -> Collaborators {
        Collaborators {
            tiles: self.tiles.unwrap_or_else(|| {
                warn!("No tile sink registered; tiles will be dropped");
                Box::new(NullCollaborator)
            }),
            objects: self.objects.unwrap_or_else(|| {
                warn!("No object view registered; objects will be dropped");
                Box::new(NullCollaborator)
            }),
            units: self.units.unwrap_or_else(|| {
                warn!("No unit spawner registered; units will be dropped");
                Box::new(NullCollaborator)
            }),
            deltas: self.deltas.unwrap_or_else(|| {
                warn!("No delta store registered; edits are kept in memory only");
                Box::new(InMemoryDeltaStore::new())
            }),
        }
    }
}
