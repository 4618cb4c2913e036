//! # World Runtime
//!
//! One tick, in order:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. DRAIN EVENTS                                                     │
//! │    ├─ Regenerate: release everything, reset the context            │
//! │    └─ Object edits: routed to the object or camp controller        │
//! │                                                                     │
//! │ 2. READINESS                                                        │
//! │    └─ At most one layer is built per tick                          │
//! │                                                                     │
//! │ 3. STREAM (only when ready)                                         │
//! │    ├─ Tiles                                                         │
//! │    ├─ Camps      (reserve ground first)                            │
//! │    ├─ Objects    (respect camp reservations)                       │
//! │    └─ Creatures  (respect camp reservations)                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use tracing::{info, warn};
use wildmere_procedural::{StreamerConfig, WorldConfig, WorldContext};
use wildmere_shared::{CellRect, InstanceId, PlannedUnit, Vec2, WorldEvent};

use crate::collaborators::Collaborators;
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{WorldEventBus, WorldEventSender};
use crate::readiness::Readiness;
use crate::streaming::camps::CampController;
use crate::streaming::creatures::CreatureController;
use crate::streaming::objects::{is_plain_index, record_offline, ObjectController, ObjectEdit};
use crate::streaming::tiles::TileController;
use crate::streaming::{StreamStats, StreamerSettings, Transition};

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number.
    pub tick: u64,
    /// Readiness after the tick.
    pub readiness: Readiness,
    /// Events drained this tick.
    pub events_processed: u32,
    /// Regenerations performed this tick.
    pub regenerations: u32,
    /// Tile chunks handled.
    pub tiles: Transition,
    /// Camp chunks handled.
    pub camps: Transition,
    /// Object chunks handled.
    pub objects: Transition,
    /// Creature chunks handled.
    pub creatures: Transition,
    /// Wall time of the tick in microseconds.
    pub elapsed_us: u64,
}

impl TickStats {
    /// Chunks loaded by all controllers.
    #[must_use]
    pub const fn loaded(&self) -> usize {
        self.tiles.loaded + self.camps.loaded + self.objects.loaded + self.creatures.loaded
    }

    /// Chunks released by all controllers.
    #[must_use]
    pub const fn released(&self) -> usize {
        self.tiles.released + self.camps.released + self.objects.released + self.creatures.released
    }
}

/// Streaming totals per controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Tile streamer.
    pub tiles: StreamStats,
    /// Camp streamer.
    pub camps: StreamStats,
    /// Object streamer.
    pub objects: StreamStats,
    /// Creature streamer.
    pub creatures: StreamStats,
}

/// The four controllers of a ready world.
#[derive(Debug)]
struct Controllers {
    tiles: TileController,
    camps: CampController,
    objects: ObjectController,
    creatures: CreatureController,
}

impl Controllers {
    fn attach(ctx: &WorldContext) -> RuntimeResult<Self> {
        let config = ctx.config();
        let settings = |streamer: &StreamerConfig| StreamerSettings::from_config(streamer, config);
        Ok(Self {
            tiles: TileController::new(settings(&config.streaming.tiles)),
            camps: CampController::new(settings(&config.streaming.camps), ctx.camp_planner()?),
            objects: ObjectController::new(settings(&config.streaming.objects), ctx.object_planner()?),
            creatures: CreatureController::new(
                settings(&config.streaming.creatures),
                ctx.creature_planner()?,
            ),
        })
    }
}

/// Owns one world and streams it around an observer.
pub struct WorldRuntime {
    context: WorldContext,
    readiness: Readiness,
    controllers: Option<Controllers>,
    collaborators: Collaborators,
    events: WorldEventBus,
    tick: u64,
    last_observer: Vec2,
}

impl WorldRuntime {
    /// Creates a runtime. Layers are built over the first ticks.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: WorldConfig, collaborators: Collaborators) -> RuntimeResult<Self> {
        let context = WorldContext::new(config)?;
        info!(
            "World runtime created: seed {}, half extent {:?}",
            context.seed().value(),
            context.config().half_extent
        );
        Ok(Self {
            context,
            readiness: Readiness::Uninitialized,
            controllers: None,
            collaborators,
            events: WorldEventBus::default(),
            tick: 0,
            last_observer: Vec2::ZERO,
        })
    }

    /// Handle for posting events.
    #[must_use]
    pub fn sender(&self) -> WorldEventSender {
        self.events.sender()
    }

    /// Runs one tick for the observer position.
    pub fn tick(&mut self, observer: Vec2) -> TickStats {
        let start = Instant::now();
        self.last_observer = observer;
        let mut stats = TickStats {
            tick: self.tick,
            ..TickStats::default()
        };

        for event in self.events.drain() {
            stats.events_processed += 1;
            match event {
                WorldEvent::Regenerate { seed, half_extent } => match self.regenerate(seed, half_extent) {
                    Ok(()) => stats.regenerations += 1,
                    Err(err) => warn!("{}", err),
                },
                WorldEvent::ObjectDestroyed { id } => self.apply_edit(id, ObjectEdit::Destroy),
                WorldEvent::ObjectTransformed { id, new_kind } => {
                    self.apply_edit(id, ObjectEdit::Transform(new_kind));
                }
            }
        }

        if !self.readiness.is_ready() {
            self.readiness = self.readiness.advance(&mut self.context);
            if self.readiness.is_ready() {
                match Controllers::attach(&self.context) {
                    Ok(controllers) => self.controllers = Some(controllers),
                    Err(err) => {
                        warn!("Streaming controllers unavailable: {}", err);
                        self.readiness = Readiness::WaitingOnDependency;
                    }
                }
            }
        }

        if let Some(controllers) = self.controllers.as_mut() {
            Self::stream(controllers, &mut self.context, &mut self.collaborators, observer, &mut stats);
        }

        stats.readiness = self.readiness;
        stats.elapsed_us = start.elapsed().as_micros() as u64;
        self.tick += 1;
        stats
    }

    fn stream(
        controllers: &mut Controllers,
        context: &mut WorldContext,
        collab: &mut Collaborators,
        observer: Vec2,
        stats: &mut TickStats,
    ) {
        let (Some(climate), Some(biomes)) = (context.climate(), context.biomes()) else {
            return;
        };
        stats.tiles = controllers.tiles.update(observer, climate, biomes, collab.tiles.as_mut());

        let Ok((biomes, reservations)) = context.planning_view("streaming") else {
            return;
        };
        stats.camps = controllers.camps.update(
            observer,
            biomes,
            reservations,
            collab.objects.as_mut(),
            collab.units.as_mut(),
            collab.deltas.as_mut(),
        );
        stats.objects = controllers.objects.update(
            observer,
            biomes,
            reservations,
            collab.objects.as_mut(),
            collab.deltas.as_mut(),
        );
        stats.creatures = controllers.creatures.update(observer, biomes, reservations, collab.units.as_mut());
    }

    fn apply_edit(&mut self, id: InstanceId, edit: ObjectEdit) {
        let collab = &mut self.collaborators;
        match self.controllers.as_mut() {
            Some(controllers) if is_plain_index(id.index) => {
                controllers
                    .objects
                    .edit(id, edit, collab.objects.as_mut(), collab.deltas.as_mut());
            }
            Some(controllers) => {
                controllers
                    .camps
                    .edit(id, edit, collab.objects.as_mut(), collab.deltas.as_mut());
            }
            None => record_offline(collab.deltas.as_mut(), id, edit),
        }
    }

    /// Releases everything, switches seed and size, and restarts the
    /// readiness cycle. Stored deltas are dropped with the old world.
    ///
    /// # Errors
    ///
    /// Returns `RegenerationRejected` if the new size is invalid; the
    /// current world is left untouched.
    pub fn regenerate(&mut self, seed: u64, half_extent: [u32; 2]) -> RuntimeResult<()> {
        if half_extent[0] < 1 || half_extent[1] < 1 {
            return Err(RuntimeError::RegenerationRejected(format!(
                "half extent {half_extent:?} is below 1x1"
            )));
        }
        if let Some(mut controllers) = self.controllers.take() {
            let collab = &mut self.collaborators;
            let reservations = self.context.reservations_mut();
            controllers.tiles.clear(collab.tiles.as_mut());
            controllers.camps.clear(
                reservations,
                collab.objects.as_mut(),
                collab.units.as_mut(),
                collab.deltas.as_mut(),
            );
            controllers.objects.clear(collab.objects.as_mut(), collab.deltas.as_mut());
            controllers.creatures.clear(collab.units.as_mut());
        }
        self.collaborators.deltas.clear();
        self.context.reset(seed, half_extent)?;
        self.readiness = Readiness::Uninitialized;
        Ok(())
    }

    /// Planned camp NPCs and creatures standing inside `rect`.
    #[must_use]
    pub fn planned_units_in(&self, rect: &CellRect) -> Vec<PlannedUnit> {
        let Some(controllers) = self.controllers.as_ref() else {
            return Vec::new();
        };
        let mut units = controllers.camps.planned_npcs_in(rect);
        units.extend(controllers.creatures.planned_units_in(rect));
        units
    }

    /// Current readiness.
    #[must_use]
    pub const fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// The world context.
    #[must_use]
    pub const fn context(&self) -> &WorldContext {
        &self.context
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Last observer position passed to `tick`.
    #[must_use]
    pub const fn observer(&self) -> Vec2 {
        self.last_observer
    }

    /// Streaming totals, or `None` before the world is ready.
    #[must_use]
    pub fn stats(&self) -> Option<RuntimeStats> {
        self.controllers.as_ref().map(|c| RuntimeStats {
            tiles: c.tiles.stats(),
            camps: c.camps.stats(),
            objects: c.objects.stats(),
            creatures: c.creatures.stats(),
        })
    }

    /// Number of live objects across active object chunks.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.controllers.as_ref().map_or(0, |c| c.objects.object_count())
    }

    /// Number of active camps.
    #[must_use]
    pub fn camp_count(&self) -> usize {
        self.controllers.as_ref().map_or(0, |c| c.camps.camps().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> WorldConfig {
        WorldConfig {
            half_extent: [64, 64],
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_ready_after_two_ticks() {
        let mut runtime = WorldRuntime::new(small(), Collaborators::headless()).unwrap();

        let first = runtime.tick(Vec2::ZERO);
        assert_eq!(first.readiness, Readiness::WaitingOnDependency);
        assert_eq!(first.loaded(), 0);

        let second = runtime.tick(Vec2::ZERO);
        assert_eq!(second.readiness, Readiness::Ready);
        assert!(second.tiles.loaded > 0);
        assert!(runtime.stats().is_some());
    }

    #[test]
    fn test_regenerate_event_restarts_cycle() {
        let mut runtime = WorldRuntime::new(small(), Collaborators::headless()).unwrap();
        runtime.tick(Vec2::ZERO);
        runtime.tick(Vec2::ZERO);
        assert!(runtime.readiness().is_ready());

        assert!(runtime.sender().request_regeneration(99, [32, 32]));
        let stats = runtime.tick(Vec2::ZERO);
        assert_eq!(stats.regenerations, 1);
        assert_eq!(stats.readiness, Readiness::WaitingOnDependency);
        assert_eq!(runtime.context().seed().value(), 99);
        assert!(runtime.context().reservations().is_empty());
    }

    #[test]
    fn test_invalid_regeneration_keeps_world() {
        let mut runtime = WorldRuntime::new(small(), Collaborators::headless()).unwrap();
        runtime.tick(Vec2::ZERO);
        runtime.tick(Vec2::ZERO);

        assert!(runtime.regenerate(5, [0, 3]).is_err());
        assert!(runtime.readiness().is_ready());
        assert_eq!(runtime.context().config().half_extent, [64, 64]);
    }
}
