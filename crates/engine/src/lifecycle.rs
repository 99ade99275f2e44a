use std::path::PathBuf;

use prism_input::{Bindings, InputManager};
use prism_kernel::{PhysicsSimulation, PlayerSimulation, World, WorldConfig};
use prism_render::Renderer;

use crate::config::Config;
use crate::error::EngineError;
use crate::map::MapLoader;
use crate::registry::WorldRegistry;

/// Map loaded when the config names neither a map nor a map path.
const DEFAULT_MAP: &str = "maps/default.json";

/// Strategy object for the pre/post lifecycle hook points.
///
/// The ordering of calls around `create_world` and `activate` is a
/// correctness contract: implementations must not assume entities exist
/// before `on_create` has run, nor that simulations are visible before the
/// registration transaction commits.
pub trait LifecycleHooks {
    fn pre_create(&mut self, _world: &mut World) {}
    fn post_create(&mut self, _world: &mut World) {}
    fn pre_start(&mut self) {}
    fn post_start(&mut self) {}
    fn pre_stop(&mut self) {}
    fn post_stop(&mut self) {}
    fn pre_destroy(&mut self, _world: &mut World) {}
    fn post_destroy(&mut self, _world: &mut World) {}
}

/// Hook strategy that does nothing at any point.
#[derive(Debug, Default)]
pub struct NoHooks;

impl LifecycleHooks for NoHooks {}

type RendererSetup = Box<dyn FnMut(&mut Renderer, &World)>;

/// Owns the single active world and drives every world through
/// create → start → stop → destroy.
///
/// The renderer and input manager are rebuilt from scratch on each
/// activation rather than patched in place; the per-swap cost buys the
/// guarantee that nothing holds resources of a retired world.
pub struct WorldLifecycleManager {
    config: Config,
    world_config: WorldConfig,
    bindings: Bindings,
    hooks: Box<dyn LifecycleHooks>,
    map_loader: Box<dyn MapLoader>,
    renderer_setup: RendererSetup,
    registry: WorldRegistry,
    active: Option<World>,
    renderer: Option<Renderer>,
    input: Option<InputManager>,
}

/// Split borrow of everything one frame phase needs from the manager.
pub struct FrameParts<'a> {
    pub world: &'a mut World,
    pub renderer: &'a mut Renderer,
    pub input: &'a mut InputManager,
}

impl WorldLifecycleManager {
    pub fn new(
        config: Config,
        hooks: Box<dyn LifecycleHooks>,
        map_loader: Box<dyn MapLoader>,
    ) -> Self {
        Self {
            config,
            world_config: WorldConfig::default(),
            bindings: Bindings::default(),
            hooks,
            map_loader,
            renderer_setup: Box::new(|_, _| {}),
            registry: WorldRegistry::new(),
            active: None,
            renderer: None,
            input: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the world tunables applied to subsequently created worlds.
    pub fn set_world_config(&mut self, world_config: WorldConfig) {
        self.world_config = world_config;
    }

    /// Replace the key bindings used for subsequently built input managers.
    pub fn set_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }

    /// Install the callback that populates each freshly built renderer with
    /// its draw passes. Runs on every activation.
    pub fn set_renderer_setup<F>(&mut self, setup: F)
    where
        F: FnMut(&mut Renderer, &World) + 'static,
    {
        self.renderer_setup = Box::new(setup);
    }

    /// Run the creation sequence on a world, in its contractual order:
    /// pre-create hook, configuration, `on_create`, simulation registration
    /// transaction (player-control before physics, since physics reads
    /// player-issued state), player init, post-create hook.
    pub fn create_world(&mut self, world: &mut World) {
        let _span = tracing::debug_span!("create_world").entered();
        self.hooks.pre_create(world);
        world.apply_config(self.world_config.clone());
        world.on_create();
        {
            let mut tx = world.transact();
            tx.add(PlayerSimulation::new());
            tx.add(PhysicsSimulation::new());
            tx.commit();
        }
        world.init_player();
        self.hooks.post_create(world);
    }

    /// Populate a created world from the configured map. Failure is a setup
    /// failure and aborts world creation.
    pub fn load_map(&mut self, world: &mut World) -> Result<(), EngineError> {
        let path = self.resolve_map_path();
        tracing::info!(path = %path.display(), "loading map");
        self.map_loader.load(&path, world)?;
        Ok(())
    }

    fn resolve_map_path(&self) -> PathBuf {
        if let Some(map) = self.config.map() {
            self.config.data_dir().join(map)
        } else if let Some(path) = self.config.map_path() {
            path.to_path_buf()
        } else {
            self.config.data_dir().join(DEFAULT_MAP)
        }
    }

    /// Make `new_world` the single active world.
    ///
    /// Any currently active world is fully retired first, in strict order:
    /// pre-stop, `on_stop`, post-stop, pre-destroy, `on_destroy`,
    /// post-destroy, drop. Only then is the new world touched: fresh
    /// renderer, fresh input manager, then pre-start, `on_start`,
    /// post-start. `None` retires without replacement (shutdown).
    pub fn activate(&mut self, new_world: Option<World>) -> Result<(), EngineError> {
        if let Some(mut old) = self.active.take() {
            let _span = tracing::debug_span!("retire_world").entered();
            self.hooks.pre_stop();
            old.on_stop();
            self.hooks.post_stop();
            self.hooks.pre_destroy(&mut old);
            old.on_destroy();
            self.hooks.post_destroy(&mut old);
        }
        self.renderer = None;
        self.input = None;

        self.active = new_world;
        if let Some(world) = self.active.as_mut() {
            let _span = tracing::debug_span!("start_world").entered();
            let mut renderer = Renderer::new(world);
            renderer.init()?;
            (self.renderer_setup)(&mut renderer, world);
            self.renderer = Some(renderer);

            let mut input = InputManager::new(self.bindings.clone());
            input.init(self.config.cursor_visible());
            self.input = Some(input);

            self.hooks.pre_start();
            world.on_start();
            self.hooks.post_start();
        }
        Ok(())
    }

    /// Create, populate, and activate the initial world.
    pub fn start_initial_world(&mut self) -> Result<(), EngineError> {
        let mut world = World::new();
        self.create_world(&mut world);
        self.load_map(&mut world)?;
        self.activate(Some(world))
    }

    /// Activate the named cached world.
    ///
    /// An absent name fails with `WorldNotFound` and mutates nothing; on
    /// success the entry leaves the registry and the previous active world
    /// is fully retired before the new one starts.
    pub fn switch_to(&mut self, name: &str) -> Result<(), EngineError> {
        let world = self
            .registry
            .take(name)
            .ok_or_else(|| EngineError::WorldNotFound(name.to_owned()))?;
        tracing::info!(%name, "switching active world");
        self.activate(Some(world))
    }

    /// Cache an inactive world for later activation.
    pub fn cache_world(&mut self, name: impl Into<String>, world: World) -> Result<(), EngineError> {
        self.registry.store(name, world)
    }

    /// Destroy every cached world immediately.
    pub fn clear_cache(&mut self) {
        self.registry.clear();
    }

    /// Retire the active world without replacement.
    pub fn shutdown(&mut self) {
        // Retiring cannot fail; activate only errors while starting a world.
        let _ = self.activate(None);
    }

    pub fn registry(&self) -> &WorldRegistry {
        &self.registry
    }

    pub fn active_world(&self) -> Option<&World> {
        self.active.as_ref()
    }

    pub fn active_world_mut(&mut self) -> Option<&mut World> {
        self.active.as_mut()
    }

    pub fn has_active_world(&self) -> bool {
        self.active.is_some()
    }

    /// Split borrow for the frame phases; `None` while no world is active.
    pub fn frame_parts(&mut self) -> Option<FrameParts<'_>> {
        match (&mut self.active, &mut self.renderer, &mut self.input) {
            (Some(world), Some(renderer), Some(input)) => Some(FrameParts {
                world,
                renderer,
                input,
            }),
            _ => None,
        }
    }
}
