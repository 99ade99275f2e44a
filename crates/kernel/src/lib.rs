//! World Kernel: the mutable simulated universe and everything that runs
//! inside one frame of it.
//!
//! # Invariants
//! - A world's lifecycle only moves forward: Uninitialized → Created →
//!   Started → Stopped → Destroyed.
//! - Simulations become visible to `World::update` only when their
//!   registration transaction commits; no update observes a partial batch.
//! - The deferred task queue is drained exactly once per frame, by the loop
//!   scheduler, never by the queue itself.

pub mod camera;
pub mod deferred;
pub mod event;
pub mod simulation;
pub mod world;

pub use camera::Camera;
pub use deferred::{DeferredTask, DeferredTaskQueue, TaskFailure};
pub use event::{BusEvent, EventBus, EventTag};
pub use simulation::{PhysicsSimulation, PlayerSimulation, Simulation, SimulationRegistry, Transaction};
pub use world::{EntityData, InputIntents, Lifecycle, World, WorldConfig};
