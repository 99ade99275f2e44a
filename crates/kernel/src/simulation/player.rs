use glam::{Quat, Vec3};
use prism_common::TimeDelta;

use crate::deferred::DeferredTaskQueue;
use crate::simulation::Simulation;
use crate::world::World;

/// Turns buffered input intents into player velocity and orientation.
///
/// Must run before the physics simulation, which integrates the velocity
/// this step writes.
#[derive(Debug, Default)]
pub struct PlayerSimulation {
    yaw: f32,
    pitch: f32,
}

impl PlayerSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    const LOOK_SENSITIVITY: f32 = 0.003;
    const PITCH_LIMIT: f32 = 1.55; // just under a quarter turn

    fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }
}

impl Simulation for PlayerSimulation {
    fn name(&self) -> &'static str {
        "player"
    }

    fn update(&mut self, world: &mut World, _dt: TimeDelta, _tasks: &DeferredTaskQueue) {
        let (dx, dy) = world.input.take_look_delta();
        self.yaw -= dx * Self::LOOK_SENSITIVITY;
        self.pitch = (self.pitch - dy * Self::LOOK_SENSITIVITY)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);

        let movement = world.input.movement;
        let jump = world.input.jump;
        world.input.clear_jump();

        let config = world.config().clone();
        let orientation = self.orientation();
        let Some(player) = world.player_mut() else {
            return;
        };

        player.transform.rotation = orientation;

        // Movement is expressed in the player's horizontal frame; vertical
        // motion belongs to gravity and jumping.
        let mut planar = movement;
        planar.y = 0.0;
        if planar.length_squared() > 0.0 {
            planar = planar.normalize();
        }
        let heading = Quat::from_rotation_y(self.yaw);
        let velocity = heading * planar * config.move_speed;
        player.velocity.x = velocity.x;
        player.velocity.z = velocity.z;

        let grounded = player.transform.position.y <= f32::EPSILON;
        if jump && grounded {
            player.velocity.y = config.jump_speed;
        }
    }
}
