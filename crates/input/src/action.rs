use std::collections::HashMap;

use prism_common::Key;

/// A high-level action the engine consumes instead of raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Jump,
    Screenshot,
    Quit,
}

/// Key-to-action map with overridable defaults.
#[derive(Debug, Clone)]
pub struct Bindings {
    map: HashMap<Key, Action>,
}

impl Default for Bindings {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(Key::W, Action::MoveForward);
        map.insert(Key::S, Action::MoveBackward);
        map.insert(Key::A, Action::StrafeLeft);
        map.insert(Key::D, Action::StrafeRight);
        map.insert(Key::Space, Action::Jump);
        map.insert(Key::G, Action::Screenshot);
        map.insert(Key::Escape, Action::Quit);
        Self { map }
    }
}

impl Bindings {
    /// Bind or rebind a key.
    pub fn bind(&mut self, key: Key, action: Action) {
        self.map.insert(key, action);
    }

    pub fn lookup(&self, key: Key) -> Option<Action> {
        self.map.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
