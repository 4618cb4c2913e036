//! # WILDMERE
//!
//! Runtime for the deterministic streamed world.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            WORLD RUNTIME                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  events ──> ┌─────────────┐      ┌──────────────────────────────────┐  │
//! │             │ WorldContext│─────>│ Controllers                      │  │
//! │             │  • climate  │      │  • tiles     ──> TileSink        │  │
//! │             │  • biomes   │      │  • camps     ──> ObjectView,     │  │
//! │             │  • reserve  │<─────│                  UnitSpawner     │  │
//! │             └─────────────┘      │  • objects   ──> ObjectView,     │  │
//! │                                  │                  DeltaStore      │  │
//! │                                  │  • creatures ──> UnitSpawner     │  │
//! │                                  └──────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `collaborators`: Output traits and their null implementations
//! - `events`: Event channel drained once per tick
//! - `readiness`: Layer initialization state machine
//! - `streaming`: Chunk streamers and the four controllers
//! - `world_loop`: Tick orchestration

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod collaborators;
pub mod error;
pub mod events;
pub mod readiness;
pub mod streaming;
pub mod world_loop;

// Re-export the generator crates
pub use wildmere_procedural as procedural;
pub use wildmere_shared as shared;

pub use collaborators::{
    Collaborators, CollaboratorsBuilder, NullCollaborator, ObjectOwner, ObjectView, TileSink,
    UnitSpawner,
};
pub use error::{RuntimeError, RuntimeResult};
pub use events::{WorldEventBus, WorldEventSender};
pub use readiness::Readiness;
pub use streaming::tiles::{TileCell, TileChunk};
pub use streaming::{ChunkStreamer, StreamDelta, StreamStats, StreamerSettings, Transition};
pub use world_loop::{RuntimeStats, TickStats, WorldRuntime};
