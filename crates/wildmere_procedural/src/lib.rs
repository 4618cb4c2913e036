//! # WILDMERE Procedural Generation
//!
//! Deterministic world generation for a streamed 2D open world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: Content is planned per fixed-size chunk, on demand
//! 3. **Arbitrated**: Independent planners never claim the same ground
//! 4. **Data only**: Planners emit records; collaborators instantiate them
//!
//! ## Core Components
//!
//! - `ClimateLayer` / `BiomeLayer`: per-cell classification of the bounded grid
//! - `ReservationMap`: masked cell claims shared by every planner
//! - `ObjectPlanner`: vegetation and props per chunk
//! - `CampPlanner`: camps with an order-independent tie-break
//! - `CreaturePlanner`: weighted creature groups
//! - `WorldContext`: the per-world service container
//!
//! ## Example
//!
//! ```rust,ignore
//! use wildmere_procedural::{WorldConfig, WorldContext};
//! use wildmere_shared::ChunkKey;
//!
//! let mut ctx = WorldContext::new(WorldConfig::from_file("data/worldgen/default_world.toml")?)?;
//! ctx.build_all()?;
//!
//! let planner = ctx.object_planner()?;
//! let (biomes, reservations) = ctx.planning_view("example")?;
//! let objects = planner.plan_chunk(ChunkKey::pack(0, 0), biomes, reservations);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod biome;
pub mod camp;
pub mod climate;
pub mod config;
pub mod context;
pub mod creature;
pub mod delta;
pub mod error;
pub mod noise;
pub mod placement;
pub mod reservation;

#[cfg(test)]
mod test_support;

pub use biome::{BiomeCatalog, BiomeLayer, ZoneBiomeTable, FALLBACK_COLOR};
pub use camp::{
    ActiveCamps, CampCandidate, CampPlanner, CampRuntime, CampStructure, CircleClaim,
    CAMP_INDEX_BIT,
};
pub use climate::{check_coverage, ClimateLayer, ClimateZone, IntervalDefect};
pub use config::{
    CampConfig, ClimateConfig, CreatureConfig, PlacementMode, PlacementRuleDef, StreamerConfig,
    StreamingConfig, WorldConfig,
};
pub use context::WorldContext;
pub use creature::{ActiveGroups, CreatureGroup, CreaturePlanner};
pub use delta::{ChunkDelta, DeltaEntry, DeltaStatus, DeltaStore, InMemoryDeltaStore};
pub use error::{WorldgenError, WorldgenResult};
pub use noise::{coherent_noise, hash01, offsets_from_seed, NoiseChannel, SimplexNoise, WorldSeed};
pub use placement::{ObjectInstance, ObjectPlanner, PlacementRule};
pub use reservation::{ReservationFlag, ReservationMap, ReservationMask};
