//! Grid and world-space math shared by the generators and the streamers.
//!
//! Cells are the integer grid; `Vec2` is continuous world space. The
//! conversion factor between the two (`cell_size`) lives in configuration,
//! never in these types.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 2D Vector - world positions, observer location
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Returns the cell containing this world position.
    #[must_use]
    pub fn to_cell(self, cell_size: f32) -> Cell {
        Cell::new(
            (self.x / cell_size).floor() as i32,
            (self.y / cell_size).floor() as i32,
        )
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Integer grid coordinate, the atomic unit of the world.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable,
    Serialize, Deserialize,
)]
pub struct Cell {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin cell.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Returns this cell shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance in cells.
    ///
    /// Computed in `i64` so far-apart cells never overflow.
    #[inline]
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// World-space position of the cell's center.
    #[must_use]
    pub fn center(self, cell_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
        )
    }

    /// The four edge-adjacent neighbors, in scan order (left, right, down, up).
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

/// Axis-aligned rectangle of cells, `min` inclusive and `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    /// Inclusive lower corner.
    pub min: Cell,
    /// Exclusive upper corner.
    pub max: Cell,
}

impl CellRect {
    /// Creates a rectangle from its corners.
    #[must_use]
    pub const fn new(min: Cell, max: Cell) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle anchored at `origin` with the given size.
    #[must_use]
    pub const fn from_origin(origin: Cell, width: u32, height: u32) -> Self {
        Self {
            min: origin,
            max: origin.offset(width as i32, height as i32),
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Returns true if the cell lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x < self.max.x && cell.y >= self.min.y && cell.y < self.max.y
    }

    /// Returns true if `other` lies fully inside this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns true if the two rectangles share at least one cell.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Iterates the cells row by row.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        let Self { min, max } = self;
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| Cell::new(x, y)))
    }
}

/// Returns true if a circle intersects an axis-aligned world rectangle.
///
/// Clamps the circle center onto the rectangle and compares squared
/// distance, so touching edges count as intersecting.
#[must_use]
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect_min: Vec2, rect_max: Vec2) -> bool {
    let nearest = Vec2::new(
        center.x.clamp(rect_min.x, rect_max.x),
        center.y.clamp(rect_min.y, rect_max.y),
    );
    center.distance_squared(nearest) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec2::new(5.0, 8.0));
        assert_eq!(a.dot(b), 16.0);
        assert_eq!(a.distance_squared(b), 25.0);
    }

    #[test]
    fn test_to_cell_floors_negative() {
        assert_eq!(Vec2::new(-0.5, 0.5).to_cell(1.0), Cell::new(-1, 0));
        assert_eq!(Vec2::new(7.9, -8.1).to_cell(2.0), Cell::new(3, -5));
    }

    #[test]
    fn test_cell_distance_no_overflow() {
        let a = Cell::new(i32::MIN, 0);
        let b = Cell::new(i32::MAX, 0);
        assert!(a.distance_squared(b) > 0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = CellRect::from_origin(Cell::new(0, 0), 4, 4);
        let b = CellRect::from_origin(Cell::new(3, 3), 2, 2);
        let c = CellRect::from_origin(Cell::new(4, 0), 2, 2);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c), "Touching rectangles share no cell");
        assert_eq!(a.cells().count(), 16);
    }

    #[test]
    fn test_circle_rect() {
        let min = Vec2::new(10.0, 0.0);
        let max = Vec2::new(20.0, 10.0);

        assert!(circle_intersects_rect(Vec2::new(5.0, 5.0), 5.0, min, max));
        assert!(!circle_intersects_rect(Vec2::new(5.0, 5.0), 4.9, min, max));
        assert!(circle_intersects_rect(Vec2::new(15.0, 5.0), 0.1, min, max));
    }

    #[test]
    fn test_cell_bytemuck() {
        let cells = [Cell::new(1, 2), Cell::new(3, 4)];
        let bytes: &[u8] = bytemuck::cast_slice(&cells);
        assert_eq!(bytes.len(), 16);
    }
}
