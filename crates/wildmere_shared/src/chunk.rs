//! # Chunk Coordinates
//!
//! The world grid is cut into fixed-size square chunks aligned to the global
//! origin. A chunk is addressed by its integer chunk coordinate and, for
//! sparse maps, by a packed 64-bit `ChunkKey`:
//!
//! ```text
//! bit 63 ............ 32 | 31 ............. 0
//!   chunk x (as u32)     |   chunk y (as u32)
//! ```
//!
//! Packing and unpacking only happen in this module.

use serde::{Deserialize, Serialize};

use crate::math::{Cell, CellRect, Vec2};

/// Default chunk width/height in cells.
pub const DEFAULT_CHUNK_SIZE: u32 = 64;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not cells).
    pub x: i32,
    /// Y coordinate (in chunks, not cells).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a cell to the coordinate of the chunk containing it.
    #[inline]
    #[must_use]
    pub const fn from_cell(cell: Cell, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self {
            x: cell.x.div_euclid(size),
            y: cell.y.div_euclid(size),
        }
    }

    /// Returns the chunk's origin (lowest) cell.
    #[inline]
    #[must_use]
    pub const fn origin(self, chunk_size: u32) -> Cell {
        let size = chunk_size as i32;
        Cell::new(self.x * size, self.y * size)
    }

    /// Returns the chunk's cell rectangle.
    #[must_use]
    pub const fn cell_rect(self, chunk_size: u32) -> CellRect {
        CellRect::from_origin(self.origin(chunk_size), chunk_size, chunk_size)
    }

    /// Returns the chunk's world-space bounds as `(min, max)`.
    #[must_use]
    pub fn world_bounds(self, chunk_size: u32, cell_size: f32) -> (Vec2, Vec2) {
        let origin = self.origin(chunk_size);
        let span = chunk_size as f32 * cell_size;
        let min = Vec2::new(origin.x as f32 * cell_size, origin.y as f32 * cell_size);
        (min, Vec2::new(min.x + span, min.y + span))
    }

    /// Packs this coordinate into a `ChunkKey`.
    #[inline]
    #[must_use]
    pub const fn key(self) -> ChunkKey {
        ChunkKey::pack(self.x, self.y)
    }
}

/// Packed 64-bit chunk identity: high 32 bits = x, low 32 bits = y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkKey(u64);

impl ChunkKey {
    /// Packs a chunk coordinate pair.
    #[inline]
    #[must_use]
    pub const fn pack(x: i32, y: i32) -> Self {
        Self(((x as u32 as u64) << 32) | (y as u32 as u64))
    }

    /// Rebuilds a key from its raw packed value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Unpacks the chunk x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(self) -> i32 {
        (self.0 >> 32) as u32 as i32
    }

    /// Unpacks the chunk y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0 as u32 as i32
    }

    /// Unpacks into a chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(self) -> ChunkCoord {
        ChunkCoord::new(self.x(), self.y())
    }

    /// Returns the key of the chunk containing `cell`.
    #[inline]
    #[must_use]
    pub const fn from_cell(cell: Cell, chunk_size: u32) -> Self {
        ChunkCoord::from_cell(cell, chunk_size).key()
    }
}

impl From<ChunkCoord> for ChunkKey {
    fn from(coord: ChunkCoord) -> Self {
        coord.key()
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_from_cell() {
        let size = 16;
        assert_eq!(ChunkCoord::from_cell(Cell::new(0, 0), size), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_cell(Cell::new(15, 15), size), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_cell(Cell::new(16, 16), size), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::from_cell(Cell::new(-1, -1), size), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_cell(Cell::new(-16, -16), size), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_cell(Cell::new(-17, -17), size), ChunkCoord::new(-2, -2));
    }

    #[test]
    fn test_key_packing_layout() {
        let key = ChunkKey::pack(1, 2);
        assert_eq!(key.raw(), (1u64 << 32) | 2);

        let key = ChunkKey::pack(-1, 0);
        assert_eq!(key.raw(), 0xFFFF_FFFF_0000_0000);
    }

    #[test]
    fn test_key_unpacks_negative_coords() {
        for (x, y) in [(0, 0), (-1, -1), (i32::MIN, i32::MAX), (12, -7)] {
            let key = ChunkKey::pack(x, y);
            assert_eq!((key.x(), key.y()), (x, y));
        }
    }

    #[test]
    fn test_world_bounds() {
        let (min, max) = ChunkCoord::new(-1, 2).world_bounds(64, 0.5);
        assert_eq!(min, Vec2::new(-32.0, 64.0));
        assert_eq!(max, Vec2::new(0.0, 96.0));
    }
}
