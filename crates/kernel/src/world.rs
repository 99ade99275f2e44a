use std::collections::BTreeMap;

use glam::Vec3;
use prism_common::{EntityId, TimeDelta, Transform};

use crate::camera::Camera;
use crate::deferred::DeferredTaskQueue;
use crate::event::EventBus;
use crate::simulation::{SimulationRegistry, Transaction};

/// Lifecycle state of a world. Transitions are one-directional; a world
/// never returns to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Uninitialized,
    Created,
    Started,
    Stopped,
    Destroyed,
}

/// World-level tunables applied during creation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Vertical acceleration, negative is down.
    pub gravity: f32,
    /// Horizontal player speed in units per second.
    pub move_speed: f32,
    /// Initial vertical velocity of a jump.
    pub jump_speed: f32,
    /// Where the player entity spawns.
    pub player_spawn: Transform,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            move_speed: 5.0,
            jump_speed: 4.5,
            player_spawn: Transform::default(),
        }
    }
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    pub transform: Transform,
    pub velocity: Vec3,
}

impl EntityData {
    fn at(transform: Transform) -> Self {
        Self {
            transform,
            velocity: Vec3::ZERO,
        }
    }
}

/// Player intent for the current frame, written by the input manager and
/// consumed by the player simulation.
#[derive(Debug, Clone, Default)]
pub struct InputIntents {
    /// Movement axes in the player's frame: +x strafe right, -z forward.
    pub movement: Vec3,
    /// Jump requested this frame.
    pub jump: bool,
    look_delta: (f32, f32),
}

impl InputIntents {
    /// Accumulate a mouse-look delta; consumed once per update.
    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look_delta.0 += dx;
        self.look_delta.1 += dy;
    }

    pub fn take_look_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn clear_jump(&mut self) {
        self.jump = false;
    }
}

/// The mutable simulated universe: entities, camera, event bus, attached
/// simulations, lifecycle state.
///
/// Exactly one world is active at a time; the lifecycle manager owns it
/// exclusively while active. Entity storage is a BTreeMap so iteration order
/// is deterministic across platforms.
pub struct World {
    pub camera: Camera,
    pub events: EventBus,
    pub input: InputIntents,
    entities: BTreeMap<EntityId, EntityData>,
    simulations: SimulationRegistry,
    player: Option<EntityId>,
    lifecycle: Lifecycle,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty, uninitialized world with default config.
    pub fn new() -> Self {
        Self {
            camera: Camera::new(),
            events: EventBus::new(),
            input: InputIntents::default(),
            entities: BTreeMap::new(),
            simulations: SimulationRegistry::new(),
            player: None,
            lifecycle: Lifecycle::Uninitialized,
            config: WorldConfig::default(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Apply world configuration. Part of the creation sequence, before
    /// `on_create` runs.
    pub fn apply_config(&mut self, config: WorldConfig) {
        self.config = config;
    }

    fn advance(&mut self, to: Lifecycle) {
        debug_assert!(
            to > self.lifecycle,
            "lifecycle moved backwards: {:?} -> {to:?}",
            self.lifecycle
        );
        tracing::debug!(from = ?self.lifecycle, to = ?to, "world lifecycle transition");
        self.lifecycle = to;
    }

    pub fn on_create(&mut self) {
        self.advance(Lifecycle::Created);
    }

    pub fn on_start(&mut self) {
        self.advance(Lifecycle::Started);
    }

    pub fn on_stop(&mut self) {
        self.advance(Lifecycle::Stopped);
    }

    pub fn on_destroy(&mut self) {
        self.advance(Lifecycle::Destroyed);
    }

    /// Spawn a new entity at the given transform. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, EntityData::at(transform));
        id
    }

    /// Remove an entity. Returns its data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityData> {
        self.entities.get_mut(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut EntityData)> {
        self.entities.iter_mut()
    }

    /// Spawn the primary controlled entity from the configured spawn
    /// transform and remember its id.
    pub fn init_player(&mut self) {
        let id = self.spawn(self.config.player_spawn);
        self.player = Some(id);
        tracing::debug!(?id, "player initialized");
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&EntityData> {
        self.player.and_then(|id| self.entities.get(&id))
    }

    pub fn player_mut(&mut self) -> Option<&mut EntityData> {
        let id = self.player?;
        self.entities.get_mut(&id)
    }

    /// Open a simulation registration transaction against this world.
    pub fn transact(&mut self) -> Transaction<'_> {
        self.simulations.transact()
    }

    /// Names of committed simulations, in the order they run.
    pub fn simulation_names(&self) -> Vec<&'static str> {
        self.simulations.names()
    }

    /// Advance the world by `dt`: fan out to every committed simulation in
    /// registration order.
    ///
    /// The registry is moved out for the duration of the fan-out so each
    /// simulation can take `&mut World`; registrations made during the
    /// fan-out are folded back in afterwards, after the existing batch.
    pub fn update(&mut self, dt: TimeDelta, tasks: &DeferredTaskQueue) {
        let mut active = std::mem::take(&mut self.simulations);
        for sim in active.iter_mut() {
            let _span = tracing::trace_span!("simulation", name = sim.name()).entered();
            sim.update(self, dt, tasks);
        }
        let added = std::mem::replace(&mut self.simulations, active);
        self.simulations.absorb(added);
    }
}
