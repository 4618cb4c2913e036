//! # Climate Layer
//!
//! Assigns one climate zone to every cell of the bounded world grid.
//!
//! ## Passes
//!
//! 1. Zone table: sort by start percentile, warn on gaps/overlaps
//! 2. Latitude: `(y + half_y) / (2 * half_y) * 100`, perturbed by
//!    `±noise_strength * 50` using a seeded noise channel
//! 3. Region merge: connected same-zone regions smaller than
//!    `min_region_size` take the most common zone around them
//!
//! The grid is written once here and read-only afterwards.

use std::collections::VecDeque;

use tracing::{info, warn};
use wildmere_shared::{Cell, CellRect, ClimateZoneId};

use crate::config::{BiomeChanceDef, ClimateConfig, ClimateZoneDef};
use crate::error::{WorldgenError, WorldgenResult};
use crate::noise::{coherent_noise, hash01, offsets_from_seed, NoiseOffset, WorldSeed};

/// Salt of the climate perturbation channel.
const CLIMATE_NOISE_SALT: u64 = 0xC1_1A7E;
/// Salt used to pick the seed-derived noise scale.
const CLIMATE_SCALE_SALT: u64 = 0xC1_5CA1;

/// Tolerance for interval coverage checks.
pub const COVERAGE_EPSILON: f64 = 1e-6;

/// A defect found in an interval table. Never fatal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntervalDefect {
    /// Nothing covers `[start, end)`.
    Gap {
        /// Start of the uncovered range.
        start: f64,
        /// End of the uncovered range.
        end: f64,
    },
    /// `[start, end)` is covered twice.
    Overlap {
        /// Start of the doubly covered range.
        start: f64,
        /// End of the doubly covered range.
        end: f64,
    },
    /// An interval is reversed or leaves the allowed range.
    OutOfRange {
        /// Interval start.
        start: f64,
        /// Interval end.
        end: f64,
    },
}

/// Checks that sorted `[start, end)` intervals tile `[low, high)` exactly.
#[must_use]
pub fn check_coverage(intervals: &[(f64, f64)], low: f64, high: f64) -> Vec<IntervalDefect> {
    let mut defects = Vec::new();
    let mut cursor = low;

    for &(start, end) in intervals {
        if start < low - COVERAGE_EPSILON || end > high + COVERAGE_EPSILON || end < start {
            defects.push(IntervalDefect::OutOfRange { start, end });
            continue;
        }
        if start > cursor + COVERAGE_EPSILON {
            defects.push(IntervalDefect::Gap { start: cursor, end: start });
        } else if start < cursor - COVERAGE_EPSILON {
            defects.push(IntervalDefect::Overlap {
                start,
                end: cursor.min(end),
            });
        }
        cursor = cursor.max(end);
    }

    if cursor < high - COVERAGE_EPSILON {
        defects.push(IntervalDefect::Gap { start: cursor, end: high });
    }
    defects
}

/// One latitude band, after sorting.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateZone {
    /// Index in the sorted zone table.
    pub id: ClimateZoneId,
    /// Zone name.
    pub name: String,
    /// Inclusive start percentile.
    pub start_percent: f64,
    /// Exclusive end percentile.
    pub end_percent: f64,
    /// Fallback biome name.
    pub default_biome: String,
    /// Biome intervals sorted by `min`.
    pub biome_chances: Vec<BiomeChanceDef>,
}

impl ClimateZone {
    fn from_def(id: ClimateZoneId, def: &ClimateZoneDef) -> Self {
        let mut biome_chances = def.biome_chances.clone();
        biome_chances.sort_by(|a, b| a.min.total_cmp(&b.min));
        Self {
            id,
            name: def.name.clone(),
            start_percent: def.start_percent,
            end_percent: def.end_percent,
            default_biome: def.default_biome.clone(),
            biome_chances,
        }
    }
}

/// The climate grid.
#[derive(Debug)]
pub struct ClimateLayer {
    half_extent: [u32; 2],
    width: usize,
    height: usize,
    zones: Vec<ClimateZone>,
    grid: Vec<ClimateZoneId>,
    noise_offset: NoiseOffset,
    noise_scale: f64,
    merged_regions: usize,
}

impl ClimateLayer {
    /// Builds the whole grid in one blocking pass.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if there are no zones, more than 256 zones, or
    /// the half extent is below 1×1.
    pub fn build(
        config: &ClimateConfig,
        half_extent: [u32; 2],
        seed: WorldSeed,
    ) -> WorldgenResult<Self> {
        if config.zones.is_empty() {
            return Err(WorldgenError::InvalidConfig("no climate zones configured".into()));
        }
        if half_extent[0] < 1 || half_extent[1] < 1 {
            return Err(WorldgenError::InvalidConfig("half_extent must be at least 1x1".into()));
        }

        let mut defs: Vec<&ClimateZoneDef> = config.zones.iter().collect();
        defs.sort_by(|a, b| a.start_percent.total_cmp(&b.start_percent));
        let zones = defs
            .iter()
            .enumerate()
            .map(|(index, def)| {
                u8::try_from(index)
                    .map(|id| ClimateZone::from_def(ClimateZoneId(id), def))
                    .map_err(|_| WorldgenError::InvalidConfig("more than 256 climate zones".into()))
            })
            .collect::<WorldgenResult<Vec<_>>>()?;

        let bands: Vec<(f64, f64)> = zones.iter().map(|z| (z.start_percent, z.end_percent)).collect();
        for defect in check_coverage(&bands, 0.0, 100.0) {
            warn!("Climate zone table defect: {:?}", defect);
        }

        let t = hash01(seed.derive(CLIMATE_SCALE_SALT).value());
        let noise_scale = config.noise_scale_min + (config.noise_scale_max - config.noise_scale_min) * t;

        let width = half_extent[0] as usize * 2 + 1;
        let height = half_extent[1] as usize * 2 + 1;

        let mut layer = Self {
            half_extent,
            width,
            height,
            zones,
            grid: Vec::with_capacity(width * height),
            noise_offset: offsets_from_seed(seed, CLIMATE_NOISE_SALT),
            noise_scale,
            merged_regions: 0,
        };

        layer.assign_zones(config);
        layer.merged_regions = layer.merge_small_regions(config.min_region_size as usize);

        info!(
            "Climate layer ready: {}x{} cells, {} zones, noise scale {:.4}, {} regions merged",
            width,
            height,
            layer.zones.len(),
            noise_scale,
            layer.merged_regions
        );
        Ok(layer)
    }

    /// Latitude and noise passes.
    fn assign_zones(&mut self, config: &ClimateConfig) {
        let hy = f64::from(self.half_extent[1]);
        let amplitude = config.noise_strength * 50.0;

        for row in 0..self.height {
            let y = row as i32 - self.half_extent[1] as i32;
            let latitude = (f64::from(y) + hy) / (2.0 * hy) * 100.0;

            for col in 0..self.width {
                let x = col as i32 - self.half_extent[0] as i32;
                let perturbation = if amplitude > 0.0 {
                    (self.octave_noise(x, y, config.octaves) * 2.0 - 1.0) * amplitude
                } else {
                    0.0
                };
                let percentile = (latitude + perturbation).clamp(0.0, 100.0);
                self.grid.push(self.zone_for_percentile(percentile));
            }
        }
    }

    /// Fractal sum of `coherent_noise`, normalized back to `[0, 1)`.
    fn octave_noise(&self, x: i32, y: i32, octaves: u32) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves.max(1) {
            total += coherent_noise(
                f64::from(x),
                f64::from(y),
                self.noise_scale * frequency,
                self.noise_offset,
            ) * amplitude;
            max_value += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / max_value
    }

    /// Zone containing a latitude percentile.
    ///
    /// The last zone is closed at both ends. A percentile inside a gap of
    /// the table belongs to the closest zone that starts below it.
    #[must_use]
    pub fn zone_for_percentile(&self, percentile: f64) -> ClimateZoneId {
        let last = self.zones.len() - 1;
        for (index, zone) in self.zones.iter().enumerate() {
            let inside_end = if index == last {
                percentile <= zone.end_percent
            } else {
                percentile < zone.end_percent
            };
            if percentile >= zone.start_percent && inside_end {
                return zone.id;
            }
        }
        self.zones
            .iter()
            .rev()
            .find(|zone| zone.start_percent <= percentile)
            .unwrap_or(&self.zones[0])
            .id
    }

    /// Reassigns small regions in one row-major pass. Returns how many were merged.
    fn merge_small_regions(&mut self, min_region_size: usize) -> usize {
        if min_region_size <= 1 {
            return 0;
        }

        let mut visited = vec![false; self.grid.len()];
        let mut in_region = vec![false; self.grid.len()];
        let mut region = Vec::new();
        let mut queue = VecDeque::new();
        let mut merged = 0;

        for start in 0..self.grid.len() {
            if visited[start] {
                continue;
            }
            let zone = self.grid[start];

            region.clear();
            queue.push_back(start);
            visited[start] = true;
            in_region[start] = true;
            while let Some(index) = queue.pop_front() {
                region.push(index);
                for next in self.neighbor_indices(index).into_iter().flatten() {
                    if !visited[next] && self.grid[next] == zone {
                        visited[next] = true;
                        in_region[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            if region.len() < min_region_size {
                if let Some(replacement) = self.dominant_neighbor(&region, &in_region) {
                    for &index in &region {
                        self.grid[index] = replacement;
                    }
                    merged += 1;
                }
            }
            for &index in &region {
                in_region[index] = false;
            }
        }
        merged
    }

    /// Most common zone among cells bordering `region`; first seen wins ties.
    fn dominant_neighbor(&self, region: &[usize], in_region: &[bool]) -> Option<ClimateZoneId> {
        let mut tally: Vec<(ClimateZoneId, usize)> = Vec::new();
        for &index in region {
            for next in self.neighbor_indices(index).into_iter().flatten() {
                if in_region[next] {
                    continue;
                }
                let zone = self.grid[next];
                match tally.iter_mut().find(|(id, _)| *id == zone) {
                    Some((_, count)) => *count += 1,
                    None => tally.push((zone, 1)),
                }
            }
        }

        let mut best: Option<(ClimateZoneId, usize)> = None;
        for (zone, count) in tally {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((zone, count));
            }
        }
        best.map(|(zone, _)| zone)
    }

    /// Grid indices of the 4-neighbors (left, right, down, up).
    fn neighbor_indices(&self, index: usize) -> [Option<usize>; 4] {
        let col = index % self.width;
        let row = index / self.width;
        [
            (col > 0).then(|| index - 1),
            (col + 1 < self.width).then(|| index + 1),
            (row > 0).then(|| index - self.width),
            (row + 1 < self.height).then(|| index + self.width),
        ]
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        let col = i64::from(cell.x) + i64::from(self.half_extent[0]);
        let row = i64::from(cell.y) + i64::from(self.half_extent[1]);
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    /// Zone of a cell, or `None` outside the bounded world.
    #[must_use]
    pub fn zone_at(&self, cell: Cell) -> Option<ClimateZoneId> {
        self.index_of(cell).map(|index| self.grid[index])
    }

    /// Definition of a zone.
    #[must_use]
    pub fn zone_data(&self, id: ClimateZoneId) -> Option<&ClimateZone> {
        self.zones.get(usize::from(id.0))
    }

    /// All zones, sorted by start percentile.
    #[must_use]
    pub fn zones(&self) -> &[ClimateZone] {
        &self.zones
    }

    /// Returns true if `cell` lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.index_of(cell).is_some()
    }

    /// Grid bounds as a cell rectangle (max exclusive).
    #[must_use]
    pub fn bounds(&self) -> CellRect {
        let hx = self.half_extent[0] as i32;
        let hy = self.half_extent[1] as i32;
        CellRect::new(Cell::new(-hx, -hy), Cell::new(hx + 1, hy + 1))
    }

    /// Half extent the grid was built with.
    #[must_use]
    pub const fn half_extent(&self) -> [u32; 2] {
        self.half_extent
    }

    /// Seed-derived perturbation scale.
    #[must_use]
    pub const fn noise_scale(&self) -> f64 {
        self.noise_scale
    }

    /// Number of small regions absorbed by the merge pass.
    #[must_use]
    pub const fn merged_regions(&self) -> usize {
        self.merged_regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, start: f64, end: f64) -> ClimateZoneDef {
        ClimateZoneDef {
            name: name.into(),
            start_percent: start,
            end_percent: end,
            default_biome: "plains".into(),
            biome_chances: vec![BiomeChanceDef {
                biome: "plains".into(),
                min: 0.0,
                max: 1.0,
            }],
        }
    }

    fn flat_config(zones: Vec<ClimateZoneDef>) -> ClimateConfig {
        ClimateConfig {
            noise_strength: 0.0,
            min_region_size: 0,
            zones,
            ..ClimateConfig::default()
        }
    }

    #[test]
    fn test_coverage_detects_gap_and_overlap() {
        assert!(check_coverage(&[(0.0, 0.5), (0.5, 1.0)], 0.0, 1.0).is_empty());

        let gap = check_coverage(&[(0.0, 0.4), (0.5, 1.0)], 0.0, 1.0);
        assert_eq!(gap, vec![IntervalDefect::Gap { start: 0.4, end: 0.5 }]);

        let overlap = check_coverage(&[(0.0, 0.6), (0.5, 1.0)], 0.0, 1.0);
        assert_eq!(overlap, vec![IntervalDefect::Overlap { start: 0.5, end: 0.6 }]);

        let tail = check_coverage(&[(0.0, 0.9)], 0.0, 1.0);
        assert!(matches!(tail[0], IntervalDefect::Gap { .. }));
    }

    #[test]
    fn test_coverage_tolerates_epsilon() {
        assert!(check_coverage(&[(0.0, 0.5), (0.500_000_1, 1.0)], 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_latitude_bands_without_noise() {
        let config = flat_config(vec![zone("south", 0.0, 50.0), zone("north", 50.0, 100.0)]);
        let layer = ClimateLayer::build(&config, [4, 10], WorldSeed::new(1)).unwrap();

        assert_eq!(layer.zone_at(Cell::new(0, -10)), Some(ClimateZoneId(0)));
        assert_eq!(layer.zone_at(Cell::new(3, -1)), Some(ClimateZoneId(0)));
        assert_eq!(layer.zone_at(Cell::new(0, 0)), Some(ClimateZoneId(1)), "50% starts north");
        assert_eq!(layer.zone_at(Cell::new(0, 10)), Some(ClimateZoneId(1)), "Last zone is closed");
        assert_eq!(layer.zone_at(Cell::new(5, 0)), None, "Outside the grid");
    }

    #[test]
    fn test_zones_sorted_by_start() {
        let config = flat_config(vec![zone("north", 50.0, 100.0), zone("south", 0.0, 50.0)]);
        let layer = ClimateLayer::build(&config, [2, 2], WorldSeed::new(1)).unwrap();
        assert_eq!(layer.zones()[0].name, "south");
        assert_eq!(layer.zone_data(ClimateZoneId(1)).unwrap().name, "north");
    }

    #[test]
    fn test_small_regions_merged() {
        // A 1% sliver: with no noise it forms a single one-row band.
        let config = ClimateConfig {
            min_region_size: 50,
            ..flat_config(vec![
                zone("south", 0.0, 49.5),
                zone("sliver", 49.5, 50.5),
                zone("north", 50.5, 100.0),
            ])
        };
        let layer = ClimateLayer::build(&config, [8, 50], WorldSeed::new(3)).unwrap();

        assert!(layer.merged_regions() >= 1);
        let sliver = ClimateZoneId(1);
        assert!(
            layer.bounds().cells().all(|cell| layer.zone_at(cell) != Some(sliver)),
            "17-cell sliver region must be absorbed"
        );
    }

    #[test]
    fn test_noise_is_deterministic() {
        let config = ClimateConfig::default();
        let a = ClimateLayer::build(&config, [64, 64], WorldSeed::new(99)).unwrap();
        let b = ClimateLayer::build(&config, [64, 64], WorldSeed::new(99)).unwrap();

        assert_eq!(a.noise_scale(), b.noise_scale());
        assert!(a.bounds().cells().all(|cell| a.zone_at(cell) == b.zone_at(cell)));
        assert!(a.noise_scale() >= config.noise_scale_min && a.noise_scale() <= config.noise_scale_max);
    }

    #[test]
    fn test_gap_falls_back_to_zone_below() {
        let config = flat_config(vec![zone("south", 0.0, 40.0), zone("north", 60.0, 100.0)]);
        let layer = ClimateLayer::build(&config, [1, 1], WorldSeed::new(1)).unwrap();
        assert_eq!(layer.zone_for_percentile(50.0), ClimateZoneId(0));
    }

    #[test]
    fn test_rejects_empty_zone_table() {
        let config = flat_config(Vec::new());
        assert!(ClimateLayer::build(&config, [4, 4], WorldSeed::new(1)).is_err());
    }
}
