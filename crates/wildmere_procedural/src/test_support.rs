//! Shared fixtures for unit tests.

use crate::biome::{BiomeCatalog, BiomeLayer};
use crate::climate::ClimateLayer;
use crate::config::{BiomeChanceDef, BiomeDef, ClimateConfig, ClimateZoneDef, WorldConfig};
use crate::noise::WorldSeed;

/// A world split into latitude bands, one biome per band, no noise.
pub fn banded_config(bands: &[(&str, f64, f64)], half_extent: [u32; 2]) -> WorldConfig {
    let zones = bands
        .iter()
        .map(|&(biome, start, end)| ClimateZoneDef {
            name: format!("{biome}_zone"),
            start_percent: start,
            end_percent: end,
            default_biome: biome.into(),
            biome_chances: vec![BiomeChanceDef {
                biome: biome.into(),
                min: 0.0,
                max: 1.0,
            }],
        })
        .collect();

    WorldConfig {
        half_extent,
        climate: ClimateConfig {
            noise_strength: 0.0,
            min_region_size: 0,
            zones,
            ..ClimateConfig::default()
        },
        biomes: bands
            .iter()
            .map(|&(name, _, _)| BiomeDef {
                name: name.into(),
                color: [10, 20, 30],
            })
            .collect(),
        placement: Vec::new(),
        ..WorldConfig::default()
    }
}

/// Builds the climate and biome layers of a config.
pub fn layers(config: &WorldConfig, seed: WorldSeed) -> (ClimateLayer, BiomeLayer) {
    let climate = ClimateLayer::build(&config.climate, config.half_extent, seed).unwrap();
    let biomes = BiomeLayer::build(
        &climate,
        BiomeCatalog::from_defs(&config.biomes),
        config.climate.biome_noise_scale,
        seed,
    );
    (climate, biomes)
}
