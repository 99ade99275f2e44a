use prism_kernel::TaskFailure;
use prism_render::RenderError;

use crate::map::MapError;

/// Engine failure taxonomy.
///
/// Setup failures (map, renderer) abort startup before the loop runs; a
/// deferred-task failure terminates the loop. `WorldNotFound` is the one
/// condition surfaced to the caller with no state mutated.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no cached world named '{0}'")]
    WorldNotFound(String),

    #[error("a world named '{0}' is already cached")]
    WorldAlreadyCached(String),

    #[error("map load failed")]
    Map(#[from] MapError),

    #[error("renderer setup failed")]
    Render(#[from] RenderError),

    #[error("fatal deferred task failure")]
    DeferredTask(#[from] TaskFailure),
}
