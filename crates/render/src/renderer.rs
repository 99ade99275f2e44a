use std::cell::RefCell;
use std::rc::Rc;

use prism_kernel::World;

/// Errors from renderer setup and draw passes.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer init failed: {0}")]
    Init(String),
    #[error("draw pass '{pass}' failed: {reason}")]
    Pass { pass: &'static str, reason: String },
}

/// A sub-renderer invoked once per frame, in the order it was added.
///
/// Passes read world state and produce output; they never mutate the world.
pub trait DrawPass {
    fn name(&self) -> &'static str;

    fn draw(&mut self, world: &World) -> Result<(), RenderError>;
}

/// Draw pipeline for the active world.
///
/// Built fresh on every world activation and dropped with the swap; the
/// per-swap rebuild trades a little cost for the guarantee that no pass
/// holds resources of a destroyed world.
pub struct Renderer {
    passes: Vec<Box<dyn DrawPass>>,
    viewport: (u32, u32),
    initialized: bool,
}

impl Renderer {
    /// Construct a renderer bound to the world being activated.
    pub fn new(world: &World) -> Self {
        tracing::debug!(entities = world.entity_count(), "building renderer");
        Self {
            passes: Vec::new(),
            viewport: (1, 1),
            initialized: false,
        }
    }

    /// One-time setup after construction. Fails are setup failures and abort
    /// activation.
    pub fn init(&mut self) -> Result<(), RenderError> {
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register a sub-renderer. Draw order is add order.
    pub fn add_pass(&mut self, pass: Box<dyn DrawPass>) {
        tracing::debug!(pass = pass.name(), "adding draw pass");
        self.passes.push(pass);
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Run every pass over the current world state.
    pub fn render(&mut self, world: &World) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("render", passes = self.passes.len()).entered();
        for pass in &mut self.passes {
            pass.draw(world)?;
        }
        Ok(())
    }
}

/// Text backend: formats the world into a human-readable frame.
///
/// The output buffer is shared so callers can keep a handle across the
/// renderer rebuilds that happen on world swaps.
pub struct DebugTextPass {
    output: Rc<RefCell<String>>,
}

impl DebugTextPass {
    pub fn new() -> Self {
        Self {
            output: Rc::new(RefCell::new(String::new())),
        }
    }

    /// Handle to the most recently rendered frame text.
    pub fn output(&self) -> Rc<RefCell<String>> {
        self.output.clone()
    }
}

impl Default for DebugTextPass {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawPass for DebugTextPass {
    fn name(&self) -> &'static str {
        "debug_text"
    }

    fn draw(&mut self, world: &World) -> Result<(), RenderError> {
        use std::fmt::Write;

        let mut out = String::new();
        let cam = &world.camera;
        let _ = writeln!(
            out,
            "=== Frame (lifecycle={:?}, entities={}) ===",
            world.lifecycle(),
            world.entity_count()
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) aspect={:.3} fov={:.1}",
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.aspect,
            cam.fov.to_degrees()
        );
        for (id, data) in world.entities() {
            let p = data.transform.position;
            let tag = if world.player_id() == Some(*id) { "*" } else { " " };
            let _ = writeln!(
                out,
                " {tag}[{:.8}] pos=({:.2}, {:.2}, {:.2})",
                &id.0.to_string()[..8],
                p.x,
                p.y,
                p.z
            );
        }

        *self.output.borrow_mut() = out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use prism_common::Transform;

    #[test]
    fn renderer_tracks_init_and_viewport() {
        let world = World::new();
        let mut renderer = Renderer::new(&world);
        assert!(!renderer.is_initialized());
        renderer.init().unwrap();
        assert!(renderer.is_initialized());

        renderer.set_viewport(1280, 720);
        assert_eq!(renderer.viewport(), (1280, 720));
        // Degenerate sizes are clamped so aspect math stays finite.
        renderer.set_viewport(0, 0);
        assert_eq!(renderer.viewport(), (1, 1));
    }

    #[test]
    fn debug_pass_formats_world_state() {
        let mut world = World::new();
        world.spawn(Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Transform::default()
        });
        world.init_player();

        let pass = DebugTextPass::new();
        let output = pass.output();

        let mut renderer = Renderer::new(&world);
        renderer.init().unwrap();
        renderer.add_pass(Box::new(pass));
        renderer.render(&world).unwrap();

        let frame = output.borrow();
        assert!(frame.contains("entities=2"));
        assert!(frame.contains("pos=(1.00, 2.00, 3.00)"));
        // The player entity is marked.
        assert!(frame.contains("*["));
    }

    struct FailingPass;

    impl DrawPass for FailingPass {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn draw(&mut self, _world: &World) -> Result<(), RenderError> {
            Err(RenderError::Pass {
                pass: "failing",
                reason: "no surface".into(),
            })
        }
    }

    #[test]
    fn pass_failure_propagates() {
        let world = World::new();
        let mut renderer = Renderer::new(&world);
        renderer.init().unwrap();
        renderer.add_pass(Box::new(FailingPass));
        assert!(renderer.render(&world).is_err());
    }

    #[test]
    fn passes_run_in_add_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Tagged(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl DrawPass for Tagged {
            fn name(&self) -> &'static str {
                self.0
            }
            fn draw(&mut self, _world: &World) -> Result<(), RenderError> {
                self.1.borrow_mut().push(self.0);
                Ok(())
            }
        }

        let world = World::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = Renderer::new(&world);
        renderer.add_pass(Box::new(Tagged("screen", order.clone())));
        renderer.add_pass(Box::new(Tagged("overlay", order.clone())));
        renderer.render(&world).unwrap();
        assert_eq!(*order.borrow(), vec!["screen", "overlay"]);
    }
}
