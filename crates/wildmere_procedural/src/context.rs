//! # World Context
//!
//! One `WorldContext` per world instance owns the seed, the configuration,
//! the two classification layers and the reservation table. Planners and
//! streaming controllers receive it by reference; nothing is looked up
//! globally.
//!
//! Layers are filled in dependency order: climate, then biomes. A slot can
//! be filled once; a second registration is rejected and the first wins.

use tracing::{error, info, warn};

use crate::biome::{BiomeCatalog, BiomeLayer};
use crate::camp::CampPlanner;
use crate::climate::ClimateLayer;
use crate::config::WorldConfig;
use crate::creature::CreaturePlanner;
use crate::error::{WorldgenError, WorldgenResult};
use crate::noise::WorldSeed;
use crate::placement::ObjectPlanner;
use crate::reservation::ReservationMap;

/// Service slot names, as reported in errors.
pub mod slot {
    /// Climate layer slot.
    pub const CLIMATE: &str = "climate";
    /// Biome layer slot.
    pub const BIOMES: &str = "biomes";
}

/// Per-world service container.
#[derive(Debug)]
pub struct WorldContext {
    seed: WorldSeed,
    config: WorldConfig,
    climate: Option<ClimateLayer>,
    biomes: Option<BiomeLayer>,
    reservations: ReservationMap,
}

impl WorldContext {
    /// Creates an empty context for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: WorldConfig) -> WorldgenResult<Self> {
        config.validate()?;
        Ok(Self {
            seed: WorldSeed::new(config.seed),
            config,
            climate: None,
            biomes: None,
            reservations: ReservationMap::new(),
        })
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Fills the climate slot with a layer built elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the slot is taken.
    pub fn register_climate(&mut self, layer: ClimateLayer) -> WorldgenResult<()> {
        if self.climate.is_some() {
            warn!("Climate layer registered twice; keeping the first");
            return Err(WorldgenError::AlreadyRegistered(slot::CLIMATE));
        }
        self.climate = Some(layer);
        Ok(())
    }

    /// Fills the biome slot with a layer built elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` without a climate layer, or
    /// `AlreadyRegistered` if the slot is taken.
    pub fn register_biomes(&mut self, layer: BiomeLayer) -> WorldgenResult<()> {
        self.require_climate(slot::BIOMES)?;
        if self.biomes.is_some() {
            warn!("Biome layer registered twice; keeping the first");
            return Err(WorldgenError::AlreadyRegistered(slot::BIOMES));
        }
        self.biomes = Some(layer);
        Ok(())
    }

    /// Builds and registers the climate layer.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the slot is taken, or any build error.
    pub fn build_climate(&mut self) -> WorldgenResult<&ClimateLayer> {
        if self.climate.is_some() {
            warn!("Climate layer already built; keeping the first");
            return Err(WorldgenError::AlreadyRegistered(slot::CLIMATE));
        }
        let layer = ClimateLayer::build(&self.config.climate, self.config.half_extent, self.seed)?;
        Ok(self.climate.insert(layer))
    }

    /// Builds and registers the biome layer on top of the climate layer.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` without a climate layer, or
    /// `AlreadyRegistered` if the slot is taken.
    pub fn build_biomes(&mut self) -> WorldgenResult<&BiomeLayer> {
        let climate = self.require_climate(slot::BIOMES)?;
        if self.biomes.is_some() {
            warn!("Biome layer already built; keeping the first");
            return Err(WorldgenError::AlreadyRegistered(slot::BIOMES));
        }
        let layer = BiomeLayer::build(
            climate,
            BiomeCatalog::from_defs(&self.config.biomes),
            self.config.climate.biome_noise_scale,
            self.seed,
        );
        Ok(self.biomes.insert(layer))
    }

    /// Builds every missing layer.
    ///
    /// # Errors
    ///
    /// Propagates layer build errors.
    pub fn build_all(&mut self) -> WorldgenResult<()> {
        if self.climate.is_none() {
            self.build_climate()?;
        }
        if self.biomes.is_none() {
            self.build_biomes()?;
        }
        Ok(())
    }

    /// Climate layer, if built.
    #[must_use]
    pub const fn climate(&self) -> Option<&ClimateLayer> {
        self.climate.as_ref()
    }

    /// Biome layer, if built.
    #[must_use]
    pub const fn biomes(&self) -> Option<&BiomeLayer> {
        self.biomes.as_ref()
    }

    /// Climate layer for a dependent `layer`; logs and fails if missing.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` if the climate layer is not built.
    pub fn require_climate(&self, layer: &'static str) -> WorldgenResult<&ClimateLayer> {
        self.climate.as_ref().ok_or_else(|| {
            error!("{} initialized before the climate layer", layer);
            WorldgenError::DependencyNotReady {
                layer,
                dependency: slot::CLIMATE,
            }
        })
    }

    /// Biome layer for a dependent `layer`; logs and fails if missing.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` if the biome layer is not built.
    pub fn require_biomes(&self, layer: &'static str) -> WorldgenResult<&BiomeLayer> {
        self.biomes.as_ref().ok_or_else(|| {
            error!("{} initialized before the biome layer", layer);
            WorldgenError::DependencyNotReady {
                layer,
                dependency: slot::BIOMES,
            }
        })
    }

    /// Returns true once both layers are built.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.climate.is_some() && self.biomes.is_some()
    }

    /// Shared reservation table.
    #[must_use]
    pub const fn reservations(&self) -> &ReservationMap {
        &self.reservations
    }

    /// Mutable reservation table.
    pub fn reservations_mut(&mut self) -> &mut ReservationMap {
        &mut self.reservations
    }

    /// Biome layer and mutable reservations together, for planners.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` if the biome layer is not built.
    pub fn planning_view(&mut self, layer: &'static str) -> WorldgenResult<(&BiomeLayer, &mut ReservationMap)> {
        match self.biomes.as_ref() {
            Some(biomes) => Ok((biomes, &mut self.reservations)),
            None => {
                error!("{} used before the biome layer", layer);
                Err(WorldgenError::DependencyNotReady {
                    layer,
                    dependency: slot::BIOMES,
                })
            }
        }
    }

    /// Object planner for this world.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` before the biome layer exists.
    pub fn object_planner(&self) -> WorldgenResult<ObjectPlanner> {
        let biomes = self.require_biomes("object planner")?;
        Ok(ObjectPlanner::new(&self.config, biomes.catalog(), self.seed))
    }

    /// Camp planner for this world.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` before the biome layer exists.
    pub fn camp_planner(&self) -> WorldgenResult<CampPlanner> {
        let biomes = self.require_biomes("camp planner")?;
        Ok(CampPlanner::new(&self.config, biomes.catalog(), self.seed))
    }

    /// Creature planner for this world.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` before the biome layer exists.
    pub fn creature_planner(&self) -> WorldgenResult<CreaturePlanner> {
        let biomes = self.require_biomes("creature planner")?;
        Ok(CreaturePlanner::new(&self.config, biomes.catalog(), self.seed))
    }

    /// Drops both layers and every reservation and switches to a new seed
    /// and size. Layers must be built again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the new half extent is below 1×1.
    pub fn reset(&mut self, seed: u64, half_extent: [u32; 2]) -> WorldgenResult<()> {
        let mut config = self.config.clone();
        config.seed = seed;
        config.half_extent = half_extent;
        config.validate()?;

        info!(
            "World reset: seed {} -> {}, half extent {:?}",
            self.seed.value(),
            seed,
            half_extent
        );
        self.config = config;
        self.seed = WorldSeed::new(seed);
        self.climate = None;
        self.biomes = None;
        self.reservations.clear();
        Ok(())
    }
}
