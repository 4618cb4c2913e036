//! World events sent from outside collaborators to the generation runtime.
//!
//! Gameplay code (combat, harvesting, the save system) never touches the
//! generators directly. It posts one of these messages and the runtime
//! applies it at the start of the next tick.

use serde::{Deserialize, Serialize};

use crate::ids::{InstanceId, ObjectKind};

/// Event type discriminator
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Full world regeneration requested
    Regenerate = 0,
    /// Placed object destroyed
    ObjectDestroyed = 1,
    /// Placed object changed type
    ObjectTransformed = 2,
}

/// Messages consumed by the world runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Throw away every generated chunk and rebuild the world.
    Regenerate {
        /// New world seed.
        seed: u64,
        /// New half extent of the bounded climate grid, in cells.
        half_extent: [u32; 2],
    },

    /// An object was destroyed (chopped tree, mined rock).
    ObjectDestroyed {
        /// The destroyed instance.
        id: InstanceId,
    },

    /// An object changed into another type (sapling grew, camp burned).
    ObjectTransformed {
        /// The changed instance.
        id: InstanceId,
        /// Its new type.
        new_kind: ObjectKind,
    },
}

impl WorldEvent {
    /// Returns the event type
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Regenerate { .. } => EventType::Regenerate,
            Self::ObjectDestroyed { .. } => EventType::ObjectDestroyed,
            Self::ObjectTransformed { .. } => EventType::ObjectTransformed,
        }
    }

    /// Returns the instance this event edits (if applicable)
    #[must_use]
    pub const fn instance(&self) -> Option<InstanceId> {
        match self {
            Self::Regenerate { .. } => None,
            Self::ObjectDestroyed { id } | Self::ObjectTransformed { id, .. } => Some(*id),
        }
    }
}
