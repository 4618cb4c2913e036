//! # WILDMERE Shared
//!
//! Plain data types used by the generators, the streaming runtime and the
//! external collaborators that consume their output.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER contain generation logic or randomness. If a type
//! needs a seed to be built, it belongs in `wildmere_procedural`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod events;
pub mod ids;
pub mod math;
pub mod units;

pub use chunk::{ChunkCoord, ChunkKey, DEFAULT_CHUNK_SIZE};
pub use events::{EventType, WorldEvent};
pub use ids::{
    BiomeId, CampId, ClimateZoneId, GroupId, InstanceId, ObjectKind, ProfileId, UnitId, UnitOwner,
};
pub use math::{circle_intersects_rect, Cell, CellRect, Vec2};
pub use units::{collect_in_rect, PlannedUnit};
