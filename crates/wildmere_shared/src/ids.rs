//! Identity newtypes.
//!
//! The core never interprets catalog entries beyond identity comparison, so
//! biomes, object kinds and creature/NPC profiles travel as small opaque ids.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkKey;

/// Biome identity (index into the biome catalog).
#[repr(transparent)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BiomeId(pub u16);

impl BiomeId {
    /// Marker for cells outside the bounded world in dense tile buffers.
    pub const VOID: Self = Self(u16::MAX);

    /// Returns true for the out-of-world marker.
    #[inline]
    #[must_use]
    pub const fn is_void(self) -> bool {
        self.0 == u16::MAX
    }
}

/// Climate zone identity (index into the sorted zone table).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClimateZoneId(pub u8);

/// Placeable object type (tree, rock, tent, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKind(pub u32);

/// Opaque reference to a creature, NPC or group profile in an external catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

/// Globally unique identity of a placed object instance.
///
/// Combines the owning chunk with a per-chunk sequential index, so no
/// central counter is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId {
    /// Chunk that generated the instance.
    pub chunk: ChunkKey,
    /// Sequential index within the chunk's generation pass.
    pub index: u32,
}

impl InstanceId {
    /// Creates an instance id.
    #[inline]
    #[must_use]
    pub const fn new(chunk: ChunkKey, index: u32) -> Self {
        Self { chunk, index }
    }

    /// Folds the id into one `u64` for collaborators that want a scalar handle.
    ///
    /// The high 32 bits hold the low 16 bits of each chunk coordinate, the
    /// low 32 bits hold the index. Unique while chunk coordinates stay within
    /// `i16` range.
    #[inline]
    #[must_use]
    pub const fn packed(self) -> u64 {
        let folded = ((self.chunk.x() as u16 as u64) << 16) | (self.chunk.y() as u16 as u64);
        (folded << 32) | self.index as u64
    }
}

/// Identity of a planned creature or NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

/// Identity of a camp: the chunk that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampId(pub ChunkKey);

/// Identity of a creature group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

/// Owner of a planned unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitOwner {
    /// NPC slot planned by a camp.
    Camp(CampId),
    /// Member of a creature group.
    Group(GroupId),
}
