//! # Chunk Streaming
//!
//! Every controller runs the same membership machine over its own chunk
//! grid:
//!
//! - Work happens only when the observer enters a new source chunk.
//! - Chunks touching the **load** circle are materialized.
//! - Active chunks no longer touching the **keep** circle are released.
//! - The keep circle is never smaller than the load circle, so a chunk at
//!   the edge does not flicker while the observer walks along it.
//!
//! ```text
//!            keep radius
//!        ┌─────────────────┐
//!        │   load radius   │
//!        │    ┌───────┐    │
//!        │    │   @   │    │   @ = observer
//!        │    └───────┘    │
//!        └─────────────────┘
//! ```

pub mod camps;
pub mod creatures;
pub mod objects;
pub mod tiles;

use std::collections::BTreeSet;

use wildmere_procedural::{StreamerConfig, WorldConfig};
use wildmere_shared::{circle_intersects_rect, ChunkCoord, ChunkKey, Vec2};

/// Radii and grid of one streamer, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamerSettings {
    /// Chunks touching this circle are loaded.
    pub load_radius: f32,
    /// Active chunks outside this circle are released.
    pub keep_radius: f32,
    /// Cells per chunk edge.
    pub chunk_size: u32,
    /// World units per cell.
    pub cell_size: f32,
}

impl StreamerSettings {
    /// Resolves one controller's settings against the world config.
    #[must_use]
    pub fn from_config(streamer: &StreamerConfig, world: &WorldConfig) -> Self {
        let load = (streamer.base_radius + streamer.load_padding).max(0.0);
        let keep = (streamer.base_radius + streamer.keep_padding).max(load);
        Self {
            load_radius: load * world.cell_size,
            keep_radius: keep * world.cell_size,
            chunk_size: streamer.chunk_size.unwrap_or(world.chunk_size).max(1),
            cell_size: world.cell_size,
        }
    }

    /// World-space edge length of one chunk.
    #[must_use]
    pub fn chunk_span(&self) -> f32 {
        self.chunk_size as f32 * self.cell_size
    }

    /// Source chunk of a world position.
    #[must_use]
    pub fn chunk_of(&self, position: Vec2) -> ChunkKey {
        ChunkKey::from_cell(position.to_cell(self.cell_size), self.chunk_size)
    }

    fn touches(&self, key: ChunkKey, center: Vec2, radius: f32) -> bool {
        let (min, max) = key.coord().world_bounds(self.chunk_size, self.cell_size);
        circle_intersects_rect(center, radius, min, max)
    }
}

/// Chunks to materialize and release after one evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamDelta {
    /// Newly active chunks, nearest first.
    pub to_load: Vec<ChunkKey>,
    /// Chunks that left the keep circle.
    pub to_unload: Vec<ChunkKey>,
}

impl StreamDelta {
    /// Returns true if nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty() && self.to_unload.is_empty()
    }
}

/// Chunks one controller handled during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Chunks materialized.
    pub loaded: usize,
    /// Chunks released.
    pub released: usize,
}

/// Running totals of one streamer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Chunks materialized since the last reset.
    pub loaded_total: u64,
    /// Chunks released since the last reset.
    pub released_total: u64,
    /// Currently active chunks.
    pub active: usize,
    /// Source-chunk changes that triggered an evaluation.
    pub evaluations: u64,
    /// Degenerate passes that force-loaded the observer's chunk.
    pub forced_loads: u64,
}

/// Active chunk set with load/keep hysteresis.
#[derive(Clone, Debug)]
pub struct ChunkStreamer {
    settings: StreamerSettings,
    active: BTreeSet<ChunkKey>,
    source: Option<ChunkKey>,
    stats: StreamStats,
}

impl ChunkStreamer {
    /// Creates an idle streamer.
    #[must_use]
    pub fn new(settings: StreamerSettings) -> Self {
        Self {
            settings,
            active: BTreeSet::new(),
            source: None,
            stats: StreamStats::default(),
        }
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &StreamerSettings {
        &self.settings
    }

    /// Evaluates membership for the observer position.
    ///
    /// Returns an empty delta while the observer stays in the same source
    /// chunk. The returned keys are already applied to the active set; the
    /// caller must release `to_unload` and materialize `to_load`.
    pub fn update(&mut self, observer: Vec2) -> StreamDelta {
        let source = self.settings.chunk_of(observer);
        if self.source == Some(source) {
            return StreamDelta::default();
        }
        self.source = Some(source);
        self.stats.evaluations += 1;

        let settings = self.settings;
        let to_unload: Vec<ChunkKey> = self
            .active
            .iter()
            .copied()
            .filter(|&key| !settings.touches(key, observer, settings.keep_radius))
            .collect();
        for key in &to_unload {
            self.active.remove(key);
        }

        let reach = (settings.load_radius / settings.chunk_span()).ceil() as i32 + 1;
        let mut to_load: Vec<ChunkKey> = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let key = ChunkCoord::new(source.x() + dx, source.y() + dy).key();
                if !self.active.contains(&key) && settings.touches(key, observer, settings.load_radius) {
                    to_load.push(key);
                }
            }
        }

        if to_load.is_empty() && self.active.is_empty() {
            self.stats.forced_loads += 1;
            to_load.push(source);
        }

        to_load.sort_by_key(|key| {
            let dx = i64::from(key.x() - source.x());
            let dy = i64::from(key.y() - source.y());
            (dx * dx + dy * dy, *key)
        });
        self.active.extend(to_load.iter().copied());

        self.stats.loaded_total += to_load.len() as u64;
        self.stats.released_total += to_unload.len() as u64;
        self.stats.active = self.active.len();

        StreamDelta { to_load, to_unload }
    }

    /// Drops every active chunk and forgets the source chunk. Returns the
    /// keys the caller must release.
    pub fn reset(&mut self) -> Vec<ChunkKey> {
        let released: Vec<ChunkKey> = std::mem::take(&mut self.active).into_iter().collect();
        self.source = None;
        self.stats.released_total += released.len() as u64;
        self.stats.active = 0;
        released
    }

    /// Active chunks in key order.
    pub fn active(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.active.iter().copied()
    }

    /// Returns true if `key` is active.
    #[must_use]
    pub fn is_active(&self, key: ChunkKey) -> bool {
        self.active.contains(&key)
    }

    /// Number of active chunks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> StreamStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(load: f32, keep: f32) -> StreamerSettings {
        StreamerSettings {
            load_radius: load,
            keep_radius: keep,
            chunk_size: 16,
            cell_size: 1.0,
        }
    }

    #[test]
    fn test_settings_from_config() {
        let world = WorldConfig {
            chunk_size: 32,
            cell_size: 2.0,
            ..WorldConfig::default()
        };
        let streamer = StreamerConfig {
            base_radius: 10.0,
            load_padding: 2.0,
            keep_padding: 6.0,
            chunk_size: None,
        };
        let s = StreamerSettings::from_config(&streamer, &world);
        assert_eq!(s.load_radius, 24.0);
        assert_eq!(s.keep_radius, 32.0);
        assert_eq!(s.chunk_size, 32);
        assert_eq!(s.chunk_span(), 64.0);
    }

    #[test]
    fn test_first_update_loads_around_observer() {
        let mut streamer = ChunkStreamer::new(settings(20.0, 30.0));
        let delta = streamer.update(Vec2::new(8.0, 8.0));

        assert!(delta.to_unload.is_empty());
        assert_eq!(delta.to_load[0], ChunkKey::pack(0, 0), "Nearest chunk first");
        assert!(delta.to_load.contains(&ChunkKey::pack(1, 1)));
        assert!(delta.to_load.contains(&ChunkKey::pack(-1, -1)));
        assert!(!delta.to_load.contains(&ChunkKey::pack(3, 0)));
        assert_eq!(streamer.active_count(), delta.to_load.len());
    }

    #[test]
    fn test_same_chunk_is_noop() {
        let mut streamer = ChunkStreamer::new(settings(20.0, 30.0));
        streamer.update(Vec2::new(1.0, 1.0));
        assert!(streamer.update(Vec2::new(14.0, 14.0)).is_empty());
        assert_eq!(streamer.stats().evaluations, 1);
    }

    #[test]
    fn test_hysteresis_keeps_edge_chunks() {
        let mut streamer = ChunkStreamer::new(settings(8.0, 24.0));
        streamer.update(Vec2::new(15.0, 8.0));
        assert!(streamer.is_active(ChunkKey::pack(0, 0)));

        // 14 units from chunk 0: outside load, inside keep.
        let delta = streamer.update(Vec2::new(30.0, 8.0));
        assert!(delta.to_unload.is_empty());
        assert!(streamer.is_active(ChunkKey::pack(0, 0)));

        let mut fresh = ChunkStreamer::new(settings(8.0, 24.0));
        fresh.update(Vec2::new(30.0, 8.0));
        assert!(!fresh.is_active(ChunkKey::pack(0, 0)));

        // 44 units away: released.
        let delta = streamer.update(Vec2::new(60.0, 8.0));
        assert!(delta.to_unload.contains(&ChunkKey::pack(0, 0)));
        assert!(!streamer.is_active(ChunkKey::pack(0, 0)));
    }

    #[test]
    fn test_zero_radius_loads_source_chunk() {
        let mut streamer = ChunkStreamer::new(settings(0.0, 0.0));
        let delta = streamer.update(Vec2::new(-5.0, 40.0));
        assert_eq!(delta.to_load, vec![ChunkKey::pack(-1, 2)]);
    }

    #[test]
    fn test_reset_releases_all() {
        let mut streamer = ChunkStreamer::new(settings(20.0, 30.0));
        let loaded = streamer.update(Vec2::new(8.0, 8.0)).to_load.len();
        let released = streamer.reset();
        assert_eq!(released.len(), loaded);
        assert_eq!(streamer.active_count(), 0);

        // Same position evaluates again after a reset.
        assert_eq!(streamer.update(Vec2::new(8.0, 8.0)).to_load.len(), loaded);
    }
}
