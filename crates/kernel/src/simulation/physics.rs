use prism_common::TimeDelta;

use crate::deferred::DeferredTaskQueue;
use crate::simulation::Simulation;
use crate::world::World;

/// Integrates gravity and velocity for every entity.
///
/// Runs after the player simulation so it sees the velocity issued from this
/// frame's input. The solver proper lives outside the kernel; this is the
/// integration step the frame loop drives.
#[derive(Debug, Default)]
pub struct PhysicsSimulation;

impl PhysicsSimulation {
    pub fn new() -> Self {
        Self
    }
}

impl Simulation for PhysicsSimulation {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn update(&mut self, world: &mut World, dt: TimeDelta, _tasks: &DeferredTaskQueue) {
        let dt_s = dt.as_sec_f32();
        let gravity = world.config().gravity;

        for (_, entity) in world.entities_mut() {
            entity.velocity.y += gravity * dt_s;
            entity.transform.position += entity.velocity * dt_s;

            // Ground plane at y = 0.
            if entity.transform.position.y < 0.0 {
                entity.transform.position.y = 0.0;
                entity.velocity.y = 0.0;
            }
        }
    }
}
