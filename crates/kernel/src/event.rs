use std::collections::HashMap;

use prism_common::Key;

use crate::deferred::DeferredTaskQueue;

/// Event-type tag used for observer subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    KeyPressed,
    KeyReleased,
    MouseMoved,
    WindowResized,
}

/// Event payload dispatched on the world's bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    MouseMoved { dx: f32, dy: f32 },
    WindowResized { width: u32, height: u32 },
}

impl BusEvent {
    pub fn tag(&self) -> EventTag {
        match self {
            BusEvent::KeyPressed(_) => EventTag::KeyPressed,
            BusEvent::KeyReleased(_) => EventTag::KeyReleased,
            BusEvent::MouseMoved { .. } => EventTag::MouseMoved,
            BusEvent::WindowResized { .. } => EventTag::WindowResized,
        }
    }
}

type Observer = Box<dyn FnMut(&BusEvent, &DeferredTaskQueue)>;

/// Per-world observer registry.
///
/// Handlers run synchronously in registration order during the input phase.
/// They never receive the world itself; any world mutation they want goes
/// through a deferred task, which the scheduler flushes after render.
#[derive(Default)]
pub struct EventBus {
    observers: HashMap<EventTag, Vec<Observer>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to an event-type tag.
    pub fn observe<F>(&mut self, tag: EventTag, handler: F)
    where
        F: FnMut(&BusEvent, &DeferredTaskQueue) + 'static,
    {
        self.observers.entry(tag).or_default().push(Box::new(handler));
    }

    /// Invoke every observer subscribed to the event's tag, in the order
    /// they subscribed.
    pub fn dispatch(&mut self, event: &BusEvent, tasks: &DeferredTaskQueue) {
        if let Some(handlers) = self.observers.get_mut(&event.tag()) {
            for handler in handlers.iter_mut() {
                handler(event, tasks);
            }
        }
    }

    /// Number of observers for a tag.
    pub fn observer_count(&self, tag: EventTag) -> usize {
        self.observers.get(&tag).map_or(0, Vec::len)
    }
}
