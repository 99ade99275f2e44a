use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use prism_common::Key;
use prism_engine::{
    Config, FrameLoopScheduler, HeadlessSurface, JsonMapLoader, NoHooks, SystemClock,
    WorldLifecycleManager,
};
use prism_kernel::{BusEvent, EventTag, World};
use prism_render::{DebugTextPass, DrawPass, RenderError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prism-play", about = "Headless player for prism worlds")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and default configuration
    Info,
    /// Run the frame loop against a map
    Run {
        /// Config file (JSON); flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Named map, resolved under the data directory
        #[arg(short, long)]
        map: Option<String>,
        /// Explicit map file path
        #[arg(long)]
        map_path: Option<PathBuf>,
        /// Data directory holding maps
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Stop after this many frames
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Leave the OS cursor visible (mouse look disabled)
        #[arg(long)]
        cursor_visible: bool,
        /// Print frame statistics on exit
        #[arg(long)]
        profiler: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("prism-play v{}", env!("CARGO_PKG_VERSION"));
            let config = Config::default();
            println!("data dir: {}", config.data_dir().display());
            println!("cursor visible: {}", config.cursor_visible());
            let world = demo_world();
            println!("simulations: {}", world.simulation_names().join(", "));
        }
        Commands::Run {
            config,
            map,
            map_path,
            data_dir,
            frames,
            cursor_visible,
            profiler,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            if let Some(map) = map {
                config.map = Some(map);
            }
            if let Some(map_path) = map_path {
                config.map_path = Some(map_path);
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if cursor_visible {
                config.cursor_visible = true;
            }
            if profiler {
                config.profiler_enabled = true;
            }
            run(config, frames)?;
        }
    }

    Ok(())
}

/// A created-but-never-started world, for introspection only.
fn demo_world() -> World {
    let config = Config::default();
    let mut manager =
        WorldLifecycleManager::new(config, Box::new(NoHooks), Box::new(JsonMapLoader::new()));
    let mut world = World::new();
    manager.create_world(&mut world);
    world
}

fn run(config: Config, frames: u64) -> anyhow::Result<()> {
    if config.console_enabled() {
        tracing::warn!("developer console requested but not built into this binary");
    }
    let profiler = config.profiler_enabled();

    let mut manager = WorldLifecycleManager::new(
        config,
        Box::new(NoHooks),
        Box::new(JsonMapLoader::new()),
    );

    let debug_text: Rc<RefCell<String>> = Rc::default();
    let setup_text = debug_text.clone();
    manager.set_renderer_setup(move |renderer, _world| {
        setup_text.borrow_mut().clear();
        renderer.add_pass(Box::new(pass_with_shared_output(
            &setup_text,
            DebugTextPass::new(),
        )));
    });

    manager.start_initial_world()?;
    install_screenshot_observer(&mut manager, debug_text.clone());

    let mut surface = HeadlessSurface::new(1280, 720);
    surface.close_after(frames);
    let mut scheduler = FrameLoopScheduler::new(surface, SystemClock::new());
    scheduler.run(&mut manager)?;

    if profiler {
        let stats = scheduler.stats();
        println!(
            "cycles={} avg={:.3}ms max={:.3}ms fps={:.1}",
            stats.cycles(),
            stats.average().as_msec(),
            stats.max().as_msec(),
            stats.fps()
        );
    }
    println!("frames presented: {}", scheduler.surface().frames_presented());

    manager.shutdown();
    Ok(())
}

/// Bridge the pass's own output buffer to the handle shared with the
/// screenshot task, so the snapshot sees the most recent frame's text.
fn pass_with_shared_output(
    shared: &Rc<RefCell<String>>,
    pass: DebugTextPass,
) -> MirroredTextPass {
    MirroredTextPass {
        inner: pass,
        shared: shared.clone(),
    }
}

struct MirroredTextPass {
    inner: DebugTextPass,
    shared: Rc<RefCell<String>>,
}

impl DrawPass for MirroredTextPass {
    fn name(&self) -> &'static str {
        "debug_text_mirror"
    }

    fn draw(&mut self, world: &World) -> Result<(), RenderError> {
        self.inner.draw(world)?;
        *self.shared.borrow_mut() = self.inner.output().borrow().clone();
        Ok(())
    }
}

/// G captures a text snapshot of the frame. The capture runs as a deferred
/// task after render, so it sees the finished frame, not a half-updated one.
fn install_screenshot_observer(manager: &mut WorldLifecycleManager, text: Rc<RefCell<String>>) {
    let Some(world) = manager.active_world_mut() else {
        return;
    };
    world.events.observe(EventTag::KeyReleased, move |event, tasks| {
        if !matches!(event, BusEvent::KeyReleased(Key::G)) {
            return;
        }
        let text = text.clone();
        tasks.enqueue(move |world| {
            let stamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let path = format!("screenshot-{stamp}.txt");
            let body = format!("{}\nentities: {}\n", text.borrow(), world.entity_count());
            // A failed capture is not worth killing the session over.
            match std::fs::write(&path, body) {
                Ok(()) => tracing::info!(%path, "captured frame snapshot"),
                Err(error) => tracing::warn!(%path, %error, "frame snapshot failed"),
            }
            Ok(())
        });
    });
}
