use std::collections::VecDeque;

use prism_common::Key;

/// An event reported by the window surface during the input phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    CloseRequested,
    Resized { width: u32, height: u32 },
    KeyPressed(Key),
    KeyReleased(Key),
    MouseMoved { dx: f32, dy: f32 },
}

/// Collaborator contract for the OS window and its event pump.
///
/// Frame pacing is this collaborator's concern; the loop imposes no cap.
pub trait WindowSurface {
    /// Poll pending OS events. Called once at the top of every cycle.
    fn process_events(&mut self) -> Vec<SurfaceEvent>;

    /// Current drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Present the rendered frame.
    fn swap_buffers(&mut self);

    fn lock_mouse(&mut self);

    fn unlock_mouse(&mut self);
}

/// Scriptable surface standing in for an OS window, the same way the debug
/// text pass stands in for a GPU backend. Each `process_events` call pops
/// one scripted frame; an optional close countdown ends the loop.
pub struct HeadlessSurface {
    size: (u32, u32),
    scripted: VecDeque<Vec<SurfaceEvent>>,
    close_after_polls: Option<u64>,
    polls: u64,
    frames_presented: u64,
    mouse_locked: bool,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            scripted: VecDeque::new(),
            close_after_polls: None,
            polls: 0,
            frames_presented: 0,
            mouse_locked: false,
        }
    }

    /// Queue the events for one upcoming cycle.
    pub fn script_frame(&mut self, events: Vec<SurfaceEvent>) {
        self.scripted.push_back(events);
    }

    /// Report a close request on the given poll (1-based), after any
    /// scripted events for that cycle.
    pub fn close_after(&mut self, polls: u64) {
        self.close_after_polls = Some(polls);
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn mouse_locked(&self) -> bool {
        self.mouse_locked
    }
}

impl WindowSurface for HeadlessSurface {
    fn process_events(&mut self) -> Vec<SurfaceEvent> {
        self.polls += 1;
        let mut events = self.scripted.pop_front().unwrap_or_default();
        if self.close_after_polls == Some(self.polls) {
            events.push(SurfaceEvent::CloseRequested);
        }
        events
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn swap_buffers(&mut self) {
        self.frames_presented += 1;
    }

    fn lock_mouse(&mut self) {
        self.mouse_locked = true;
    }

    fn unlock_mouse(&mut self) {
        self.mouse_locked = false;
    }
}
