//! Pluggable per-frame behaviors and their batch-registration transaction.

mod physics;
mod player;

pub use physics::PhysicsSimulation;
pub use player::PlayerSimulation;

use prism_common::TimeDelta;

use crate::deferred::DeferredTaskQueue;
use crate::world::World;

/// A per-frame behavior attached to a world.
///
/// Simulations hold no ownership of the world; they receive it, plus the
/// elapsed time, on every update and run in the order they were registered.
pub trait Simulation {
    fn name(&self) -> &'static str;

    fn update(&mut self, world: &mut World, dt: TimeDelta, tasks: &DeferredTaskQueue);
}

/// Ordered collection of simulations, mutated only through a [`Transaction`].
#[derive(Default)]
pub struct SimulationRegistry {
    sims: Vec<Box<dyn Simulation>>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a batch-registration transaction. The exclusive borrow makes
    /// overlapping transactions a compile error rather than a runtime rule.
    pub fn transact(&mut self) -> Transaction<'_> {
        Transaction {
            registry: self,
            pending: Vec::new(),
            committed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }

    /// Names of committed simulations, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.sims.iter().map(|s| s.name()).collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Simulation>> {
        self.sims.iter_mut()
    }

    /// Append every simulation of `other` after the existing ones.
    /// Used by `World::update` to fold in registrations made mid-frame.
    pub fn absorb(&mut self, mut other: SimulationRegistry) {
        self.sims.append(&mut other.sims);
    }
}

/// Scoped builder that buffers simulation registrations and commits them as
/// a unit, so no reader of the registry observes a partially populated set.
///
/// `commit` consumes the transaction; dropping an uncommitted transaction
/// commits the batch too (scope-exit semantics), and the guard flag keeps
/// the two paths from double-applying.
pub struct Transaction<'a> {
    registry: &'a mut SimulationRegistry,
    pending: Vec<Box<dyn Simulation>>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    /// Buffer a simulation. It becomes visible only at commit.
    pub fn add<S: Simulation + 'static>(&mut self, sim: S) {
        self.pending.push(Box::new(sim));
    }

    /// Number of buffered, not yet visible, simulations.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Commit the batch explicitly.
    pub fn commit(mut self) {
        self.apply();
    }

    fn apply(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "committing simulation batch");
            self.registry.sims.append(&mut self.pending);
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.apply();
    }
}
