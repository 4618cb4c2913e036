//! # Reservation Service
//!
//! A sparse per-cell bitmask table. Generators that run independently of
//! each other (objects, camps, creatures) all consult it before placing
//! anything, so a camp footprint claimed early can never be overwritten by
//! vegetation planned later.
//!
//! ## Semantics
//!
//! - Reserving ORs bits into every cell of a disc.
//! - Releasing ANDs the complement out of the same disc; cells whose mask
//!   drops to zero are removed from the table.
//! - A cell is reserved under `M` if it shares any bit with `M`.
//!
//! All calls happen on the tick thread, so ordering is call order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wildmere_shared::Cell;

/// One named reservation flag, as written in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationFlag {
    /// Vegetation and static props.
    Nature,
    /// Camp footprints.
    Camps,
    /// Creature spawning.
    Creatures,
    /// Every subsystem.
    All,
}

/// Bit set of reservation flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ReservationFlag>", into = "Vec<ReservationFlag>")]
pub struct ReservationMask(u8);

impl ReservationMask {
    /// No bits.
    pub const NONE: Self = Self(0);
    /// Vegetation and static props.
    pub const NATURE: Self = Self(1);
    /// Camp footprints.
    pub const CAMPS: Self = Self(1 << 1);
    /// Creature spawning.
    pub const CREATURES: Self = Self(1 << 2);
    /// Every subsystem.
    pub const ALL: Self = Self(0b111);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the two masks share any bit.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two masks.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self` with every bit of `other` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    const fn from_flag(flag: ReservationFlag) -> Self {
        match flag {
            ReservationFlag::Nature => Self::NATURE,
            ReservationFlag::Camps => Self::CAMPS,
            ReservationFlag::Creatures => Self::CREATURES,
            ReservationFlag::All => Self::ALL,
        }
    }
}

impl std::ops::BitOr for ReservationMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl From<Vec<ReservationFlag>> for ReservationMask {
    fn from(flags: Vec<ReservationFlag>) -> Self {
        flags
            .into_iter()
            .fold(Self::NONE, |mask, flag| mask.union(Self::from_flag(flag)))
    }
}

impl From<ReservationMask> for Vec<ReservationFlag> {
    fn from(mask: ReservationMask) -> Self {
        if mask.contains(ReservationMask::ALL) {
            return vec![ReservationFlag::All];
        }
        [
            ReservationFlag::Nature,
            ReservationFlag::Camps,
            ReservationFlag::Creatures,
        ]
        .into_iter()
        .filter(|flag| mask.intersects(ReservationMask::from_flag(*flag)))
        .collect()
    }
}

/// The masked spatial claim table.
#[derive(Debug, Default)]
pub struct ReservationMap {
    cells: HashMap<Cell, ReservationMask>,
}

impl ReservationMap {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs `mask` into every cell within `radius` of `center`.
    ///
    /// Returns the number of cells touched.
    pub fn reserve_circle(&mut self, center: Cell, radius: u32, mask: ReservationMask) -> usize {
        if mask.is_empty() {
            return 0;
        }
        let mut touched = 0;
        for cell in disc(center, radius) {
            let entry = self.cells.entry(cell).or_default();
            *entry = entry.union(mask);
            touched += 1;
        }
        touched
    }

    /// ANDs the complement of `mask` into every cell within `radius` of `center`.
    ///
    /// Cells left with no bits are dropped from the table.
    pub fn release_circle(&mut self, center: Cell, radius: u32, mask: ReservationMask) {
        for cell in disc(center, radius) {
            if let Some(entry) = self.cells.get_mut(&cell) {
                *entry = entry.without(mask);
                if entry.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Returns true if any bit of `mask` is set on `cell`.
    #[inline]
    #[must_use]
    pub fn is_reserved(&self, cell: Cell, mask: ReservationMask) -> bool {
        self.cells
            .get(&cell)
            .is_some_and(|bits| bits.intersects(mask))
    }

    /// Returns the full mask stored for `cell`.
    #[must_use]
    pub fn mask_at(&self, cell: Cell) -> ReservationMask {
        self.cells.get(&cell).copied().unwrap_or_default()
    }

    /// Number of cells holding at least one bit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if nothing is reserved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drops every reservation (full world regeneration).
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// Cells within `radius` of `center`, by squared-distance comparison.
pub fn disc(center: Cell, radius: u32) -> impl Iterator<Item = Cell> {
    let r = i64::from(radius);
    let r_sq = r * r;
    let ri = radius as i32;
    (-ri..=ri).flat_map(move |dy| {
        (-ri..=ri).filter_map(move |dx| {
            let d_sq = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);
            (d_sq <= r_sq).then(|| center.offset(dx, dy))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_marks_whole_disc() {
        let mut map = ReservationMap::new();
        let center = Cell::new(10, -4);
        let touched = map.reserve_circle(center, 3, ReservationMask::NATURE);

        assert_eq!(touched, disc(center, 3).count());
        for dy in -5..=5 {
            for dx in -5..=5 {
                let cell = center.offset(dx, dy);
                let inside = i64::from(dx * dx + dy * dy) <= 9;
                assert_eq!(map.is_reserved(cell, ReservationMask::NATURE), inside);
            }
        }
    }

    #[test]
    fn test_release_clears_and_collects() {
        let mut map = ReservationMap::new();
        map.reserve_circle(Cell::ORIGIN, 4, ReservationMask::NATURE);
        map.release_circle(Cell::ORIGIN, 4, ReservationMask::NATURE);

        assert!(!map.is_reserved(Cell::ORIGIN, ReservationMask::NATURE));
        assert!(map.is_empty(), "Empty masks must be removed from the table");
    }

    #[test]
    fn test_partial_release_keeps_other_bits() {
        let mut map = ReservationMap::new();
        map.reserve_circle(Cell::ORIGIN, 2, ReservationMask::NATURE | ReservationMask::CAMPS);
        map.reserve_circle(Cell::ORIGIN, 1, ReservationMask::CREATURES);
        map.release_circle(Cell::ORIGIN, 2, ReservationMask::NATURE);

        assert!(!map.is_reserved(Cell::ORIGIN, ReservationMask::NATURE));
        assert!(map.is_reserved(Cell::ORIGIN, ReservationMask::CAMPS));
        assert!(map.is_reserved(Cell::ORIGIN, ReservationMask::CREATURES));
        assert_eq!(
            map.mask_at(Cell::new(2, 0)),
            ReservationMask::CAMPS,
            "Only the released bit is cleared"
        );
    }

    #[test]
    fn test_any_bit_semantics() {
        let mut map = ReservationMap::new();
        map.reserve_circle(Cell::ORIGIN, 0, ReservationMask::CAMPS);

        assert!(map.is_reserved(Cell::ORIGIN, ReservationMask::ALL));
        assert!(map.is_reserved(Cell::ORIGIN, ReservationMask::CAMPS | ReservationMask::NATURE));
        assert!(!map.is_reserved(Cell::ORIGIN, ReservationMask::NATURE));
        assert!(!map.is_reserved(Cell::new(1, 0), ReservationMask::ALL));
    }

    #[test]
    fn test_zero_radius_is_single_cell() {
        assert_eq!(disc(Cell::new(5, 5), 0).collect::<Vec<_>>(), vec![Cell::new(5, 5)]);
    }

    #[test]
    fn test_mask_flags_roundtrip() {
        let mask = ReservationMask::from(vec![ReservationFlag::Nature, ReservationFlag::Creatures]);
        assert!(mask.contains(ReservationMask::NATURE));
        assert!(!mask.intersects(ReservationMask::CAMPS));

        let flags: Vec<ReservationFlag> = ReservationMask::ALL.into();
        assert_eq!(flags, vec![ReservationFlag::All]);
    }
}
