//! # Chunk Deltas
//!
//! Planned objects are never stored: the planner regenerates them from the
//! seed. What gameplay changes (a chopped tree, a burned tent) is kept as a
//! small per-chunk delta keyed by the instance index.
//!
//! ## Flow
//!
//! 1. On chunk load the stored delta is applied to the fresh plan
//! 2. Edits while the chunk is active are recorded into the delta
//! 3. On unload the delta is emitted, flagged changed or unchanged, for the
//!    persistence collaborator to serialize

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use wildmere_shared::{ChunkKey, ObjectKind};

use crate::placement::ObjectInstance;

/// Change recorded for one instance index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    /// The instance no longer exists.
    pub destroyed: bool,
    /// The instance changed type.
    pub new_kind: Option<ObjectKind>,
}

/// All changes of one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Chunk the delta belongs to.
    pub chunk: ChunkKey,
    entries: BTreeMap<u32, DeltaEntry>,
}

impl ChunkDelta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new(chunk: ChunkKey) -> Self {
        Self {
            chunk,
            entries: BTreeMap::new(),
        }
    }

    /// Marks an instance destroyed.
    pub fn record_destroyed(&mut self, index: u32) {
        self.entries.entry(index).or_default().destroyed = true;
    }

    /// Records a type change.
    pub fn record_transformed(&mut self, index: u32, kind: ObjectKind) {
        self.entries.entry(index).or_default().new_kind = Some(kind);
    }

    /// Entry of an instance index.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&DeltaEntry> {
        self.entries.get(&index)
    }

    /// Entries in index order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &DeltaEntry)> {
        self.entries.iter().map(|(index, entry)| (*index, entry))
    }

    /// Number of changed instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy holding only the entries whose index passes `keep`.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(u32) -> bool) -> Self {
        Self {
            chunk: self.chunk,
            entries: self
                .entries
                .iter()
                .filter(|(index, _)| keep(**index))
                .map(|(index, entry)| (*index, *entry))
                .collect(),
        }
    }

    /// Overlays `other` onto this delta. Destruction is sticky; a newer
    /// type replaces an older one.
    pub fn merge(&mut self, other: &Self) {
        for (index, entry) in &other.entries {
            let slot = self.entries.entry(*index).or_default();
            slot.destroyed |= entry.destroyed;
            if entry.new_kind.is_some() {
                slot.new_kind = entry.new_kind;
            }
        }
    }

    /// Applies the delta to a fresh plan of the same chunk.
    ///
    /// Destroyed instances are removed, transformed ones change kind.
    /// Returns how many instances were affected.
    pub fn apply(&self, objects: &mut Vec<ObjectInstance>) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let before = objects.len();
        objects.retain(|object| !self.get(object.id.index).is_some_and(|entry| entry.destroyed));
        let mut affected = before - objects.len();

        for object in objects.iter_mut() {
            if let Some(kind) = self.get(object.id.index).and_then(|entry| entry.new_kind) {
                object.kind = kind;
                affected += 1;
            }
        }
        affected
    }
}

/// Whether a released delta differs from what was loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaStatus {
    /// Edits happened while the chunk was active.
    Changed,
    /// Nothing new to persist.
    Unchanged,
}

/// External persistence of chunk deltas.
pub trait DeltaStore {
    /// Delta previously stored for a chunk.
    fn load(&self, chunk: ChunkKey) -> Option<ChunkDelta>;

    /// Receives the delta of a released chunk.
    fn store(&mut self, delta: ChunkDelta, status: DeltaStatus);

    /// Drops every stored delta. Called when the world is regenerated,
    /// since old edits no longer match the new plans.
    fn clear(&mut self);
}

/// Delta store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryDeltaStore {
    deltas: HashMap<ChunkKey, ChunkDelta>,
    writes: usize,
}

impl InMemoryDeltaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks with a stored delta.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Number of `Changed` deltas written.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl DeltaStore for InMemoryDeltaStore {
    fn load(&self, chunk: ChunkKey) -> Option<ChunkDelta> {
        self.deltas.get(&chunk).cloned()
    }

    fn store(&mut self, delta: ChunkDelta, status: DeltaStatus) {
        if status == DeltaStatus::Unchanged {
            return;
        }
        self.writes += 1;
        if delta.is_empty() {
            self.deltas.remove(&delta.chunk);
        } else {
            self.deltas.insert(delta.chunk, delta);
        }
    }

    fn clear(&mut self) {
        self.deltas.clear();
    }
}
