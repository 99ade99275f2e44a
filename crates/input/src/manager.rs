use std::collections::HashSet;

use glam::Vec3;
use prism_common::Key;
use prism_kernel::{BusEvent, DeferredTaskQueue, World};

use crate::action::{Action, Bindings};

/// Translates surface key/mouse events into world input intents and bus
/// events.
///
/// One manager serves one world activation; the lifecycle manager builds a
/// fresh one on every swap so held keys never leak across worlds.
pub struct InputManager {
    bindings: Bindings,
    held: HashSet<Action>,
    mouse_locked: bool,
}

impl InputManager {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
            mouse_locked: false,
        }
    }

    /// Bind to the newly active world. Clears held state and reports whether
    /// the surface should lock the mouse (hidden cursor implies lock).
    pub fn init(&mut self, cursor_visible: bool) -> bool {
        self.held.clear();
        self.mouse_locked = !cursor_visible;
        tracing::debug!(mouse_locked = self.mouse_locked, "input manager bound");
        self.mouse_locked
    }

    pub fn mouse_locked(&self) -> bool {
        self.mouse_locked
    }

    /// Feed a key transition. Dispatches the bus event, updates held state
    /// and the world's movement/jump intents, and returns the mapped action
    /// so the caller can react to loop-level actions like Quit.
    pub fn handle_key(
        &mut self,
        key: Key,
        pressed: bool,
        world: &mut World,
        tasks: &DeferredTaskQueue,
    ) -> Option<Action> {
        let event = if pressed {
            BusEvent::KeyPressed(key)
        } else {
            BusEvent::KeyReleased(key)
        };
        world.events.dispatch(&event, tasks);

        let action = self.bindings.lookup(key)?;
        if pressed {
            self.held.insert(action);
            if action == Action::Jump {
                world.input.jump = true;
            }
        } else {
            self.held.remove(&action);
        }
        world.input.movement = self.movement_vector();
        Some(action)
    }

    /// Feed relative mouse motion. Only reaches the world while the mouse
    /// is locked, mirroring how an OS surface only reports relative motion
    /// in captured mode.
    pub fn handle_mouse(&mut self, dx: f32, dy: f32, world: &mut World, tasks: &DeferredTaskQueue) {
        if !self.mouse_locked {
            return;
        }
        world.events.dispatch(&BusEvent::MouseMoved { dx, dy }, tasks);
        world.input.add_look(dx, dy);
    }

    /// Feed a viewport resize.
    pub fn handle_resize(
        &mut self,
        width: u32,
        height: u32,
        world: &mut World,
        tasks: &DeferredTaskQueue,
    ) {
        world
            .events
            .dispatch(&BusEvent::WindowResized { width, height }, tasks);
    }

    fn movement_vector(&self) -> Vec3 {
        let mut m = Vec3::ZERO;
        if self.held.contains(&Action::MoveForward) {
            m.z -= 1.0;
        }
        if self.held.contains(&Action::MoveBackward) {
            m.z += 1.0;
        }
        if self.held.contains(&Action::StrafeLeft) {
            m.x -= 1.0;
        }
        if self.held.contains(&Action::StrafeRight) {
            m.x += 1.0;
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_kernel::EventTag;

    fn manager() -> InputManager {
        InputManager::new(Bindings::default())
    }

    #[test]
    fn held_keys_produce_movement_intent() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();

        input.handle_key(Key::W, true, &mut world, &tasks);
        assert_eq!(world.input.movement, Vec3::new(0.0, 0.0, -1.0));

        input.handle_key(Key::D, true, &mut world, &tasks);
        assert_eq!(world.input.movement, Vec3::new(1.0, 0.0, -1.0));

        input.handle_key(Key::W, false, &mut world, &tasks);
        assert_eq!(world.input.movement, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn jump_key_sets_jump_intent_once() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();

        input.handle_key(Key::Space, true, &mut world, &tasks);
        assert!(world.input.jump);
        world.input.clear_jump();

        input.handle_key(Key::Space, false, &mut world, &tasks);
        assert!(!world.input.jump);
    }

    #[test]
    fn key_events_reach_bus_observers() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();

        world.events.observe(EventTag::KeyReleased, |event, tasks| {
            if matches!(event, BusEvent::KeyReleased(Key::G)) {
                tasks.enqueue(|_| Ok(()));
            }
        });

        input.handle_key(Key::G, true, &mut world, &tasks);
        assert!(tasks.is_empty());
        input.handle_key(Key::G, false, &mut world, &tasks);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn quit_action_is_reported_to_caller() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();
        let action = input.handle_key(Key::Escape, true, &mut world, &tasks);
        assert_eq!(action, Some(Action::Quit));
    }

    #[test]
    fn unbound_key_still_dispatches_but_maps_to_nothing() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();
        assert_eq!(input.handle_key(Key::Unknown, true, &mut world, &tasks), None);
        assert_eq!(world.input.movement, Vec3::ZERO);
    }

    #[test]
    fn mouse_motion_requires_lock() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();

        input.init(true); // cursor visible -> unlocked
        input.handle_mouse(5.0, 0.0, &mut world, &tasks);
        assert_eq!(world.input.take_look_delta(), (0.0, 0.0));

        input.init(false); // hidden cursor -> locked
        input.handle_mouse(5.0, 2.0, &mut world, &tasks);
        assert_eq!(world.input.take_look_delta(), (5.0, 2.0));
    }

    #[test]
    fn init_clears_held_state() {
        let mut world = World::new();
        let tasks = DeferredTaskQueue::new();
        let mut input = manager();

        input.handle_key(Key::W, true, &mut world, &tasks);
        input.init(true);
        input.handle_key(Key::D, true, &mut world, &tasks);
        // W from before the rebind is gone.
        assert_eq!(world.input.movement, Vec3::new(1.0, 0.0, 0.0));
    }
}
