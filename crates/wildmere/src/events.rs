//! # World Event Channel
//!
//! Outside code talks to the runtime by message only:
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │  Gameplay /  │─────>│   Event     │─────>│ WorldRuntime │
//! │  Save system │      │   Channel   │      │  (per tick)  │
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! The runtime owns the channel and drains it at the start of every tick.
//! Senders are cheap clones; a full channel drops the event and reports it.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;
use wildmere_shared::WorldEvent;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Bounded channel of world events.
pub struct WorldEventBus {
    sender: Sender<WorldEvent>,
    receiver: Receiver<WorldEvent>,
}

impl WorldEventBus {
    /// Creates a channel holding at most `capacity` pending events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> WorldEventSender {
        WorldEventSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes every pending event (non-blocking).
    pub fn drain(&self) -> Vec<WorldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for WorldEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for posting events to the runtime.
#[derive(Clone)]
pub struct WorldEventSender {
    sender: Sender<WorldEvent>,
}

impl WorldEventSender {
    /// Posts an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    pub fn send(&self, event: WorldEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("World event channel full; dropping {:?}", event.event_type());
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Requests a full regeneration with a new seed and size.
    pub fn request_regeneration(&self, seed: u64, half_extent: [u32; 2]) -> bool {
        self.send(WorldEvent::Regenerate { seed, half_extent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildmere_shared::{ChunkKey, InstanceId};

    #[test]
    fn test_event_send_drain() {
        let bus = WorldEventBus::new(8);
        let sender = bus.sender();

        assert!(sender.request_regeneration(7, [16, 16]));
        assert!(sender.send(WorldEvent::ObjectDestroyed {
            id: InstanceId::new(ChunkKey::pack(0, 0), 3),
        }));
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], WorldEvent::Regenerate { seed: 7, half_extent: [16, 16] });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_channel_drops() {
        let bus = WorldEventBus::new(1);
        let sender = bus.sender();
        assert!(sender.request_regeneration(1, [4, 4]));
        assert!(!sender.request_regeneration(2, [4, 4]));
        assert_eq!(bus.drain().len(), 1);
    }
}
