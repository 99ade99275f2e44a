use std::collections::BTreeMap;

use prism_kernel::World;

use crate::error::EngineError;

/// Name-keyed cache of inactive, fully-constructed worlds.
///
/// Worlds in the cache are paused and owned by the registry; taking one out
/// is a full ownership transfer to the caller. Names are unique.
#[derive(Default)]
pub struct WorldRegistry {
    worlds: BTreeMap<String, World>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a world under a unique name.
    pub fn store(&mut self, name: impl Into<String>, world: World) -> Result<(), EngineError> {
        let name = name.into();
        if self.worlds.contains_key(&name) {
            return Err(EngineError::WorldAlreadyCached(name));
        }
        tracing::debug!(%name, "caching world");
        self.worlds.insert(name, world);
        Ok(())
    }

    /// Remove and return the named world, transferring ownership out.
    pub fn take(&mut self, name: &str) -> Option<World> {
        self.worlds.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.worlds.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.worlds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Destroy every cached world immediately.
    pub fn clear(&mut self) {
        if !self.worlds.is_empty() {
            tracing::debug!(count = self.worlds.len(), "clearing world cache");
        }
        self.worlds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_take_transfers_ownership() {
        let mut registry = WorldRegistry::new();
        registry.store("hub", World::new()).unwrap();
        assert!(registry.contains("hub"));
        assert_eq!(registry.len(), 1);

        let world = registry.take("hub");
        assert!(world.is_some());
        assert!(!registry.contains("hub"));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = WorldRegistry::new();
        registry.store("hub", World::new()).unwrap();
        let err = registry.store("hub", World::new()).unwrap_err();
        assert!(matches!(err, EngineError::WorldAlreadyCached(name) if name == "hub"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn take_absent_returns_none_without_mutation() {
        let mut registry = WorldRegistry::new();
        registry.store("hub", World::new()).unwrap();
        assert!(registry.take("void").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clear_releases_everything() {
        let mut registry = WorldRegistry::new();
        registry.store("a", World::new()).unwrap();
        registry.store("b", World::new()).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn names_iterate_in_sorted_order() {
        let mut registry = WorldRegistry::new();
        registry.store("zeta", World::new()).unwrap();
        registry.store("alpha", World::new()).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
