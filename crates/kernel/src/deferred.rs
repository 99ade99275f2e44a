use std::cell::RefCell;

use crate::world::World;

/// A unit of work captured during a cycle and run once after render.
///
/// Tasks receive whatever world is active at flush time; a task that assumes
/// a specific world instance must capture the state it needs by value, since
/// the active world may have been swapped between enqueue and flush.
pub type DeferredTask = Box<dyn FnOnce(&mut World) -> Result<(), TaskFailure>>;

/// Failure of a flushed deferred task. There are no retry or partial-state
/// semantics for mid-frame corruption, so the loop treats this as fatal.
#[derive(Debug, thiserror::Error)]
#[error("deferred task failed: {0}")]
pub struct TaskFailure(pub String);

/// FIFO of work that must not run mid-mutation.
///
/// `enqueue` is valid from update, from event handlers, and from render; the
/// queue never drains itself. Interior mutability keeps enqueue callable
/// without threading `&mut` through every simulation and observer; the whole
/// engine is single-threaded by construction.
#[derive(Default)]
pub struct DeferredTaskQueue {
    pending: RefCell<Vec<DeferredTask>>,
}

impl DeferredTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the pending sequence.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce(&mut World) -> Result<(), TaskFailure> + 'static,
    {
        self.pending.borrow_mut().push(Box::new(task));
    }

    /// Number of tasks waiting for the next flush.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run every pending task in enqueue order against the current world.
    ///
    /// The queue is emptied up front, so no undone work leaks into the next
    /// frame even when a task fails, and a task enqueuing further work does
    /// not extend the current flush. The first failure propagates.
    pub fn flush(&self, world: &mut World) -> Result<(), TaskFailure> {
        let drained = std::mem::take(&mut *self.pending.borrow_mut());
        if drained.is_empty() {
            return Ok(());
        }
        let _span = tracing::debug_span!("deferred_flush", tasks = drained.len()).entered();
        for task in drained {
            task(world)?;
        }
        Ok(())
    }
}
