//! Shared primitives: entity identity, spatial transforms, engine time,
//! physical keys.
//!
//! # Invariants
//! - `EntityId` ordering is stable across platforms (Uuid byte order).
//! - `TimeDelta` arithmetic never clamps; callers decide clamping policy.

pub mod time;
pub mod types;

pub use time::TimeDelta;
pub use types::{EntityId, Key, Transform};
