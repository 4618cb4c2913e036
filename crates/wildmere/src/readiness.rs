//! # Readiness
//!
//! Layers come up in order over successive ticks:
//!
//! ```text
//! Uninitialized ──climate built──> WaitingOnDependency ──biomes built──> Ready
//!       ^                                                                  │
//!       └──────────────────────────── regeneration ───────────────────────┘
//! ```
//!
//! Each tick calls `advance` once. Nothing streams until `Ready`.

use tracing::{error, info};
use wildmere_procedural::{WorldContext, WorldgenError};

/// Initialization state of a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
    /// No layer exists yet.
    #[default]
    Uninitialized,
    /// Climate exists; the biome layer is still pending.
    WaitingOnDependency,
    /// Both layers exist; streaming may run.
    Ready,
}

impl Readiness {
    /// Performs at most one initialization step.
    ///
    /// Layers registered from outside are picked up instead of rebuilt. A
    /// failed step logs and keeps the current state.
    #[must_use]
    pub fn advance(self, ctx: &mut WorldContext) -> Self {
        match self {
            Self::Uninitialized => {
                if ctx.climate().is_some() {
                    return Self::WaitingOnDependency;
                }
                match ctx.build_climate() {
                    Ok(climate) => {
                        info!(
                            "Climate layer ready: {} zones, {} regions merged",
                            climate.zones().len(),
                            climate.merged_regions()
                        );
                        Self::WaitingOnDependency
                    }
                    Err(err) => {
                        error!("Climate layer failed: {}", err);
                        self
                    }
                }
            }
            Self::WaitingOnDependency => {
                if ctx.biomes().is_some() {
                    return Self::Ready;
                }
                match ctx.build_biomes() {
                    Ok(biomes) => {
                        info!("Biome layer ready: {} biomes", biomes.catalog().len());
                        Self::Ready
                    }
                    Err(WorldgenError::DependencyNotReady { .. }) => Self::Uninitialized,
                    Err(err) => {
                        error!("Biome layer failed: {}", err);
                        self
                    }
                }
            }
            Self::Ready => self,
        }
    }

    /// Returns true once streaming may run.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
