//! Planned units: creatures and NPCs that exist only as data until a
//! spawning collaborator instantiates them.

use serde::{Deserialize, Serialize};

use crate::ids::{ProfileId, UnitId, UnitOwner};
use crate::math::{Cell, CellRect};

/// One planned creature or NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedUnit {
    /// Globally addressable id.
    pub id: UnitId,
    /// Spawn cell.
    pub cell: Cell,
    /// Creature or NPC profile in the external catalog.
    pub profile: ProfileId,
    /// Camp or group that planned it.
    pub owner: UnitOwner,
}

/// Appends the units of `units` that stand inside `rect`.
pub fn collect_in_rect<'a>(
    units: impl IntoIterator<Item = &'a PlannedUnit>,
    rect: &CellRect,
    out: &mut Vec<PlannedUnit>,
) {
    out.extend(units.into_iter().filter(|unit| rect.contains(unit.cell)).copied());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::GroupId;

    #[test]
    fn test_collect_in_rect() {
        let owner = UnitOwner::Group(GroupId(1));
        let units = [
            PlannedUnit { id: UnitId(1), cell: Cell::new(0, 0), profile: ProfileId(5), owner },
            PlannedUnit { id: UnitId(2), cell: Cell::new(10, 0), profile: ProfileId(5), owner },
        ];
        let mut out = Vec::new();
        collect_in_rect(&units, &CellRect::from_origin(Cell::ORIGIN, 4, 4), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, UnitId(1));
    }
}
