//! # Biome Classification
//!
//! Determines the biome of every cell, one layer above climate.
//!
//! Each climate zone owns a table of `(biome, [min, max))` intervals. A cell
//! samples an independent noise channel and takes the first interval that
//! contains the sample, or the zone's default biome if none does.

use std::collections::HashMap;

use tracing::{info, warn};
use wildmere_shared::{BiomeId, Cell, CellRect, ClimateZoneId};

use crate::climate::{check_coverage, ClimateLayer};
use crate::config::BiomeDef;
use crate::noise::{NoiseChannel, WorldSeed};

/// Salt of the biome selection channel (distinct from climate's).
const BIOME_NOISE_SALT: u64 = 0xB1_0E;

/// Color reported for biomes without metadata.
pub const FALLBACK_COLOR: [u8; 3] = [255, 0, 255];

#[derive(Clone, Debug)]
struct BiomeEntry {
    name: String,
    color: Option<[u8; 3]>,
}

/// Interned biome names and their display metadata.
///
/// Ids are assigned in insertion order: configured biomes first, then any
/// name referenced without metadata.
#[derive(Clone, Debug, Default)]
pub struct BiomeCatalog {
    entries: Vec<BiomeEntry>,
    by_name: HashMap<String, BiomeId>,
}

impl BiomeCatalog {
    /// Builds the catalog from configured biome metadata.
    #[must_use]
    pub fn from_defs(defs: &[BiomeDef]) -> Self {
        let mut catalog = Self::default();
        for def in defs {
            let id = catalog.intern(&def.name);
            catalog.entries[usize::from(id.0)].color = Some(def.color);
        }
        catalog
    }

    /// Returns the id for `name`, adding a metadata-less entry if needed.
    pub fn intern(&mut self, name: &str) -> BiomeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        // VOID stays reserved
        let index = self.entries.len().min(usize::from(u16::MAX - 1));
        let id = BiomeId(index as u16);
        if index == self.entries.len() {
            self.entries.push(BiomeEntry {
                name: name.to_owned(),
                color: None,
            });
            self.by_name.insert(name.to_owned(), id);
        }
        id
    }

    /// Looks up a biome by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<BiomeId> {
        self.by_name.get(name).copied()
    }

    /// Name of a biome.
    #[must_use]
    pub fn name(&self, id: BiomeId) -> Option<&str> {
        self.entries.get(usize::from(id.0)).map(|entry| entry.name.as_str())
    }

    /// Returns true if the biome was configured with metadata.
    #[must_use]
    pub fn has_metadata(&self, id: BiomeId) -> bool {
        self.entries
            .get(usize::from(id.0))
            .is_some_and(|entry| entry.color.is_some())
    }

    /// Display color, or `FALLBACK_COLOR` when metadata is missing.
    #[must_use]
    pub fn color(&self, id: BiomeId) -> [u8; 3] {
        self.entries
            .get(usize::from(id.0))
            .and_then(|entry| entry.color)
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Number of interned biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved biome table of one climate zone.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneBiomeTable {
    /// Biome used when no interval matches.
    pub default_biome: BiomeId,
    /// `(biome, min, max)` sorted by `min`.
    pub intervals: Vec<(BiomeId, f64, f64)>,
}

impl ZoneBiomeTable {
    /// First interval containing `sample`, else the default biome.
    #[must_use]
    pub fn select(&self, sample: f64) -> BiomeId {
        self.intervals
            .iter()
            .find(|(_, min, max)| sample >= *min && sample < *max)
            .map_or(self.default_biome, |(biome, _, _)| *biome)
    }
}

/// The biome grid, with the catalog that names its ids.
#[derive(Debug)]
pub struct BiomeLayer {
    catalog: BiomeCatalog,
    tables: Vec<ZoneBiomeTable>,
    bounds: CellRect,
    grid: Vec<BiomeId>,
    channel: NoiseChannel,
}

impl BiomeLayer {
    /// Builds the grid on top of a finished climate layer.
    ///
    /// Coverage holes, overlaps and missing metadata are logged and
    /// tolerated.
    #[must_use]
    pub fn build(
        climate: &ClimateLayer,
        mut catalog: BiomeCatalog,
        noise_scale: f64,
        seed: WorldSeed,
    ) -> Self {
        let mut tables = Vec::with_capacity(climate.zones().len());
        for zone in climate.zones() {
            let intervals: Vec<(BiomeId, f64, f64)> = zone
                .biome_chances
                .iter()
                .map(|chance| (catalog.intern(&chance.biome), chance.min, chance.max))
                .collect();
            let spans: Vec<(f64, f64)> = intervals.iter().map(|&(_, min, max)| (min, max)).collect();
            for defect in check_coverage(&spans, 0.0, 1.0) {
                warn!("Zone '{}' biome table defect: {:?}", zone.name, defect);
            }
            tables.push(ZoneBiomeTable {
                default_biome: catalog.intern(&zone.default_biome),
                intervals,
            });
        }

        let mut missing: Vec<BiomeId> = Vec::new();
        for table in &tables {
            let referenced = std::iter::once(table.default_biome)
                .chain(table.intervals.iter().map(|&(biome, _, _)| biome));
            for biome in referenced {
                if !catalog.has_metadata(biome) && !missing.contains(&biome) {
                    missing.push(biome);
                    warn!(
                        "Biome '{}' is referenced by a climate zone but has no metadata",
                        catalog.name(biome).unwrap_or("?")
                    );
                }
            }
        }

        let channel = NoiseChannel::new(seed, BIOME_NOISE_SALT, noise_scale);
        let bounds = climate.bounds();
        let mut grid = Vec::with_capacity((bounds.width() * bounds.height()) as usize);
        for cell in bounds.cells() {
            let biome = climate
                .zone_at(cell)
                .and_then(|zone| tables.get(usize::from(zone.0)))
                .map_or(BiomeId::VOID, |table| table.select(channel.sample(cell)));
            grid.push(biome);
        }

        info!(
            "Biome layer ready: {} biomes, {} zone tables, {} cells",
            catalog.len(),
            tables.len(),
            grid.len()
        );

        Self {
            catalog,
            tables,
            bounds,
            grid,
            channel,
        }
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.bounds.contains(cell) {
            return None;
        }
        let col = (cell.x - self.bounds.min.x) as usize;
        let row = (cell.y - self.bounds.min.y) as usize;
        Some(row * self.bounds.width() as usize + col)
    }

    /// Biome of a cell, or `None` outside the bounded world.
    #[must_use]
    pub fn biome_at(&self, cell: Cell) -> Option<BiomeId> {
        self.index_of(cell).map(|index| self.grid[index])
    }

    /// Display color of a biome.
    #[must_use]
    pub fn biome_color(&self, biome: BiomeId) -> [u8; 3] {
        self.catalog.color(biome)
    }

    /// Resolved table of a climate zone.
    #[must_use]
    pub fn zone_table(&self, zone: ClimateZoneId) -> Option<&ZoneBiomeTable> {
        self.tables.get(usize::from(zone.0))
    }

    /// Raw biome-noise sample at a cell.
    #[must_use]
    pub fn noise_at(&self, cell: Cell) -> f64 {
        self.channel.sample(cell)
    }

    /// The catalog naming this layer's ids.
    #[must_use]
    pub const fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }

    /// World bounds (max exclusive).
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        self.bounds
    }

    /// Number of cells of `biome` inside `rect`.
    #[must_use]
    pub fn count_in(&self, rect: &CellRect, biome: BiomeId) -> usize {
        rect.cells().filter(|&cell| self.biome_at(cell) == Some(biome)).count()
    }

    /// Returns true if any cell within `radius` of `center` has `biome`.
    #[must_use]
    pub fn any_within(&self, center: Cell, radius: u32, biome: BiomeId) -> bool {
        crate::reservation::disc(center, radius).any(|cell| self.biome_at(cell) == Some(biome))
    }

    /// Copies the biome ids of `rect` in row-major order, `VOID` outside the world.
    pub fn fill_rect(&self, rect: &CellRect, out: &mut Vec<BiomeId>) {
        out.clear();
        out.extend(rect.cells().map(|cell| self.biome_at(cell).unwrap_or(BiomeId::VOID)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BiomeChanceDef, ClimateConfig, ClimateZoneDef};

    fn chance(biome: &str, min: f64, max: f64) -> BiomeChanceDef {
        BiomeChanceDef {
            biome: biome.into(),
            min,
            max,
        }
    }

    fn single_zone(chances: Vec<BiomeChanceDef>) -> ClimateConfig {
        ClimateConfig {
            noise_strength: 0.0,
            min_region_size: 0,
            zones: vec![ClimateZoneDef {
                name: "all".into(),
                start_percent: 0.0,
                end_percent: 100.0,
                default_biome: "plains".into(),
                biome_chances: chances,
            }],
            ..ClimateConfig::default()
        }
    }

    fn catalog() -> BiomeCatalog {
        BiomeCatalog::from_defs(&[
            BiomeDef {
                name: "plains".into(),
                color: [1, 2, 3],
            },
            BiomeDef {
                name: "forest".into(),
                color: [4, 5, 6],
            },
        ])
    }

    #[test]
    fn test_catalog_interning() {
        let mut catalog = catalog();
        assert_eq!(catalog.id("plains"), Some(BiomeId(0)));
        assert_eq!(catalog.intern("forest"), BiomeId(1));

        let swamp = catalog.intern("swamp");
        assert_eq!(swamp, BiomeId(2));
        assert!(!catalog.has_metadata(swamp));
        assert_eq!(catalog.color(swamp), FALLBACK_COLOR);
        assert_eq!(catalog.color(BiomeId(1)), [4, 5, 6]);
    }

    #[test]
    fn test_table_select_and_fallback() {
        let table = ZoneBiomeTable {
            default_biome: BiomeId(9),
            intervals: vec![(BiomeId(1), 0.0, 0.3), (BiomeId(2), 0.5, 1.0)],
        };
        assert_eq!(table.select(0.1), BiomeId(1));
        assert_eq!(table.select(0.3), BiomeId(9), "Upper bound is exclusive");
        assert_eq!(table.select(0.4), BiomeId(9), "Hole falls back to default");
        assert_eq!(table.select(0.99), BiomeId(2));
    }

    #[test]
    fn test_single_biome_world() {
        let config = single_zone(vec![chance("plains", 0.0, 1.0)]);
        let seed = WorldSeed::new(12345);
        let climate = ClimateLayer::build(&config, [32, 32], seed).unwrap();
        let layer = BiomeLayer::build(&climate, catalog(), config.biome_noise_scale, seed);

        let plains = layer.catalog().id("plains").unwrap();
        assert!(layer.bounds().cells().all(|cell| layer.biome_at(cell) == Some(plains)));
        assert_eq!(layer.biome_at(Cell::new(33, 0)), None);
        assert_eq!(layer.biome_color(plains), [1, 2, 3]);
    }

    #[test]
    fn test_mixed_biomes_follow_noise() {
        let config = single_zone(vec![chance("forest", 0.0, 0.5), chance("plains", 0.5, 1.0)]);
        let seed = WorldSeed::new(7);
        let climate = ClimateLayer::build(&config, [48, 48], seed).unwrap();
        let layer = BiomeLayer::build(&climate, catalog(), 0.05, seed);

        let forest = layer.catalog().id("forest").unwrap();
        for cell in layer.bounds().cells().step_by(37) {
            let expected = if layer.noise_at(cell) < 0.5 { Some(forest) } else { layer.catalog().id("plains") };
            assert_eq!(layer.biome_at(cell), expected, "Cell {:?}", cell);
        }
    }

    #[test]
    fn test_unknown_biome_interned_without_metadata() {
        let config = single_zone(vec![chance("glacier", 0.0, 1.0)]);
        let seed = WorldSeed::new(1);
        let climate = ClimateLayer::build(&config, [4, 4], seed).unwrap();
        let layer = BiomeLayer::build(&climate, catalog(), 0.05, seed);

        let glacier = layer.catalog().id("glacier").unwrap();
        assert_eq!(layer.biome_at(Cell::ORIGIN), Some(glacier));
        assert_eq!(layer.biome_color(glacier), FALLBACK_COLOR);
    }

    #[test]
    fn test_fill_rect_marks_void() {
        let config = single_zone(vec![chance("plains", 0.0, 1.0)]);
        let seed = WorldSeed::new(1);
        let climate = ClimateLayer::build(&config, [2, 2], seed).unwrap();
        let layer = BiomeLayer::build(&climate, catalog(), 0.05, seed);

        let mut out = Vec::new();
        layer.fill_rect(&CellRect::from_origin(Cell::new(0, 0), 4, 4), &mut out);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], BiomeId(0));
        assert!(out[15].is_void());
    }
}
