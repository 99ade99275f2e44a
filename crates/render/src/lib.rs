//! Rendering adapter: draw-pass pipeline bound to exactly one world.
//!
//! # Invariants
//! - A renderer is built fresh for each world activation and never survives
//!   a swap; stale references into a destroyed world cannot outlive it.
//! - Passes run in the order they were added and never mutate the world.
//!
//! # Workaround
//! Ships a debug text pass as the backend, standing in for a GPU pipeline.
//! The `DrawPass` trait is the stable seam; a GPU implementation slots in
//! without changing consumers.

mod renderer;

pub use renderer::{DebugTextPass, DrawPass, RenderError, Renderer};
