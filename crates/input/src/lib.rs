//! Input mapping: physical keys to high-level actions, and the manager that
//! feeds the active world's intents and event bus.
//!
//! # Invariants
//! - The kernel consumes actions and intents, never raw key events.
//! - The manager is rebuilt on every world activation; held-key state never
//!   crosses a swap.

pub mod action;
pub mod manager;

pub use action::{Action, Bindings};
pub use manager::InputManager;
