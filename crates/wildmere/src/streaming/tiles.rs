//! # Tile Streaming
//!
//! Materializes biome and climate ids per cell for the tile collaborator.
//! Tiles carry no randomness of their own; they are a window onto the two
//! precomputed layers.

use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wildmere_procedural::{BiomeLayer, ClimateLayer};
use wildmere_shared::{BiomeId, Cell, CellRect, ChunkKey, ClimateZoneId, Vec2};

use super::{ChunkStreamer, StreamStats, StreamerSettings, Transition};
use crate::collaborators::TileSink;

const NO_ZONE: u8 = u8::MAX;

/// One cell as handed to the tile collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct TileCell {
    /// Raw biome id; `BiomeId::VOID` outside the world.
    pub biome: u16,
    /// Raw climate zone id; `u8::MAX` outside the world.
    pub zone: u8,
    /// Padding for alignment.
    pub _padding: u8,
}

impl TileCell {
    /// Cell outside the bounded world.
    pub const VOID: Self = Self {
        biome: BiomeId::VOID.0,
        zone: NO_ZONE,
        _padding: 0,
    };

    /// Biome, if inside the world.
    #[must_use]
    pub fn biome(self) -> Option<BiomeId> {
        let id = BiomeId(self.biome);
        (!id.is_void()).then_some(id)
    }

    /// Climate zone, if inside the world.
    #[must_use]
    pub fn zone(self) -> Option<ClimateZoneId> {
        (self.zone != NO_ZONE).then_some(ClimateZoneId(self.zone))
    }
}

/// Tiles of one chunk, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct TileChunk {
    /// Chunk identity on the tile grid.
    pub key: ChunkKey,
    /// Cells covered.
    pub rect: CellRect,
    cells: Vec<TileCell>,
}

impl TileChunk {
    /// Reads one chunk out of the layers.
    #[must_use]
    pub fn build(key: ChunkKey, chunk_size: u32, climate: &ClimateLayer, biomes: &BiomeLayer) -> Self {
        let rect = key.coord().cell_rect(chunk_size);
        let cells = rect
            .cells()
            .map(|cell| match (biomes.biome_at(cell), climate.zone_at(cell)) {
                (Some(biome), Some(zone)) => TileCell {
                    biome: biome.0,
                    zone: zone.0,
                    _padding: 0,
                },
                _ => TileCell::VOID,
            })
            .collect();
        Self { key, rect, cells }
    }

    /// Tile of a world cell, if it lies in this chunk.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<TileCell> {
        if !self.rect.contains(cell) {
            return None;
        }
        let x = (cell.x - self.rect.min.x) as usize;
        let y = (cell.y - self.rect.min.y) as usize;
        self.cells.get(y * self.rect.width() as usize + x).copied()
    }

    /// All tiles, row-major.
    #[must_use]
    pub fn cells(&self) -> &[TileCell] {
        &self.cells
    }

    /// Raw bytes of the tile array, for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Number of tiles inside the bounded world.
    #[must_use]
    pub fn land_count(&self) -> usize {
        self.cells.iter().filter(|tile| tile.biome().is_some()).count()
    }
}

/// Streams tile chunks to a `TileSink`.
#[derive(Debug)]
pub struct TileController {
    streamer: ChunkStreamer,
}

impl TileController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(settings: StreamerSettings) -> Self {
        Self {
            streamer: ChunkStreamer::new(settings),
        }
    }

    /// Streams around the observer.
    pub fn update(
        &mut self,
        observer: Vec2,
        climate: &ClimateLayer,
        biomes: &BiomeLayer,
        sink: &mut dyn TileSink,
    ) -> Transition {
        let delta = self.streamer.update(observer);
        for &key in &delta.to_unload {
            debug!("Tile chunk {} released", key);
            sink.tiles_released(key);
        }
        let chunk_size = self.streamer.settings().chunk_size;
        for &key in &delta.to_load {
            let chunk = TileChunk::build(key, chunk_size, climate, biomes);
            debug!("Tile chunk {} loaded ({} land tiles)", key, chunk.land_count());
            sink.tiles_loaded(&chunk);
        }
        Transition {
            loaded: delta.to_load.len(),
            released: delta.to_unload.len(),
        }
    }

    /// Releases every active chunk.
    pub fn clear(&mut self, sink: &mut dyn TileSink) -> usize {
        let released = self.streamer.reset();
        for &key in &released {
            sink.tiles_released(key);
        }
        released.len()
    }

    /// The underlying streamer.
    #[must_use]
    pub const fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> StreamStats {
        self.streamer.stats()
    }
}
