//! World lifecycle orchestration and frame-loop scheduling.
//!
//! One world is active at a time. The [`WorldLifecycleManager`] drives it
//! through create → start → stop → destroy and rewires the renderer and
//! input manager on every swap; the [`FrameLoopScheduler`] runs the
//! input → update → render → deferred-flush cycle against it. Cached
//! alternate worlds live in the [`WorldRegistry`] until switched in by name.
//!
//! # Invariants
//! - Phase order within a cycle never changes: events, then update, then
//!   render, then deferred flush.
//! - The renderer and input manager are rebuilt, never patched, on every
//!   world activation.
//! - Ownership of a world is transferred, never shared: registry → manager
//!   on switch, manager → drop on retire.

pub mod audio;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod map;
pub mod registry;
pub mod scheduler;
pub mod window;

pub use audio::{AudioSink, NullAudio};
pub use config::{Config, ConfigError};
pub use error::EngineError;
pub use lifecycle::{FrameParts, LifecycleHooks, NoHooks, WorldLifecycleManager};
pub use map::{JsonMapLoader, MapError, MapLoader};
pub use registry::WorldRegistry;
pub use scheduler::{Clock, FrameLoopScheduler, FrameStats, SystemClock};
pub use window::{HeadlessSurface, SurfaceEvent, WindowSurface};
