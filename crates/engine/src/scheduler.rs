use std::time::Instant;

use glam::Vec3;
use prism_common::TimeDelta;
use prism_input::Action;
use prism_kernel::{DeferredTaskQueue, World};

use crate::audio::{AudioSink, NullAudio};
use crate::error::EngineError;
use crate::lifecycle::WorldLifecycleManager;
use crate::window::{SurfaceEvent, WindowSurface};

/// Time source polled once per update phase.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin (typically loop start).
    fn now(&mut self) -> TimeDelta;
}

/// Wall-clock time since construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> TimeDelta {
        TimeDelta::msec(self.start.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Instance-owned frame statistics: ring buffer of recent frame durations
/// plus a total cycle count. Nothing here is process-global.
#[derive(Debug)]
pub struct FrameStats {
    history: Vec<TimeDelta>,
    capacity: usize,
    index: usize,
    filled: bool,
    cycles: u64,
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![TimeDelta::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
            cycles: 0,
        }
    }

    pub fn record(&mut self, dt: TimeDelta) {
        self.cycles += 1;
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn window(&self) -> &[TimeDelta] {
        let count = if self.filled { self.capacity } else { self.index };
        &self.history[..count]
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn average(&self) -> TimeDelta {
        let window = self.window();
        if window.is_empty() {
            return TimeDelta::ZERO;
        }
        let total: f64 = window.iter().map(|d| d.as_msec()).sum();
        TimeDelta::msec(total / window.len() as f64)
    }

    pub fn max(&self) -> TimeDelta {
        self.window()
            .iter()
            .copied()
            .fold(TimeDelta::ZERO, |a, b| if b > a { b } else { a })
    }

    /// Average frames per second over the recorded window.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_msec();
        if avg <= 0.0 { 0.0 } else { 1000.0 / avg }
    }
}

/// The outer loop: poll events, advance the active world by elapsed time,
/// render it, flush deferred tasks.
///
/// Single-threaded and cooperative; correctness rests on the fixed phase
/// order, not on locks. Closing sets a flag checked at the top of each
/// iteration, so the cycle that observes a close request still completes,
/// deferred tasks included.
pub struct FrameLoopScheduler<S: WindowSurface, C: Clock> {
    surface: S,
    clock: C,
    tasks: DeferredTaskQueue,
    stats: FrameStats,
    audio: Box<dyn AudioSink>,
    current_time: TimeDelta,
    last_update: TimeDelta,
    last_render: TimeDelta,
    closed: bool,
}

impl<S: WindowSurface, C: Clock> FrameLoopScheduler<S, C> {
    pub fn new(surface: S, clock: C) -> Self {
        Self {
            surface,
            clock,
            tasks: DeferredTaskQueue::new(),
            stats: FrameStats::new(120),
            audio: Box::new(NullAudio),
            current_time: TimeDelta::ZERO,
            last_update: TimeDelta::ZERO,
            last_render: TimeDelta::ZERO,
            closed: false,
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Request loop termination. Honored at the top of the next iteration.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_running(&self) -> bool {
        !self.closed
    }

    pub fn tasks(&self) -> &DeferredTaskQueue {
        &self.tasks
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn last_update(&self) -> TimeDelta {
        self.last_update
    }

    /// Drive cycles until a close request is observed.
    pub fn run(&mut self, manager: &mut WorldLifecycleManager) -> Result<(), EngineError> {
        if manager.config().cursor_visible() {
            self.surface.unlock_mouse();
        } else {
            self.surface.lock_mouse();
        }
        while !self.closed {
            self.run_cycle(manager)?;
        }
        Ok(())
    }

    /// One full iteration: pre-cycle, update, render, post-cycle.
    pub fn run_cycle(&mut self, manager: &mut WorldLifecycleManager) -> Result<(), EngineError> {
        let _span = tracing::trace_span!("cycle").entered();
        self.pre_cycle(manager);
        self.update(manager);
        self.render(manager)?;
        self.post_cycle(manager)
    }

    /// Poll OS events and dispatch them synchronously. Event handlers may
    /// enqueue deferred tasks; nothing runs them until post-cycle.
    fn pre_cycle(&mut self, manager: &mut WorldLifecycleManager) {
        let events = self.surface.process_events();
        if events.is_empty() {
            return;
        }

        let Some(parts) = manager.frame_parts() else {
            for event in &events {
                if matches!(event, SurfaceEvent::CloseRequested) {
                    self.closed = true;
                }
            }
            return;
        };

        for event in events {
            match event {
                SurfaceEvent::CloseRequested => self.closed = true,
                SurfaceEvent::Resized { width, height } => {
                    parts.input.handle_resize(width, height, parts.world, &self.tasks);
                }
                SurfaceEvent::KeyPressed(key) => {
                    let action = parts.input.handle_key(key, true, parts.world, &self.tasks);
                    if action == Some(Action::Quit) {
                        self.closed = true;
                    }
                }
                SurfaceEvent::KeyReleased(key) => {
                    parts.input.handle_key(key, false, parts.world, &self.tasks);
                }
                SurfaceEvent::MouseMoved { dx, dy } => {
                    parts.input.handle_mouse(dx, dy, parts.world, &self.tasks);
                }
            }
        }
    }

    /// Advance the active world by the elapsed time since the previous
    /// update. The elapsed value is deliberately unclamped: a long gap
    /// (debugger pause, machine suspend) passes through unmodified.
    fn update(&mut self, manager: &mut WorldLifecycleManager) {
        let now = self.clock.now();
        self.current_time = now;
        let elapsed = now - self.last_update;

        if let Some(parts) = manager.frame_parts() {
            if let Some(player) = parts.world.player() {
                self.audio
                    .sync_listener(player.transform.position, player.transform.rotation);
            }
            parts.world.update(elapsed, &self.tasks);
        }
        self.last_update = now;
    }

    /// Recompute the camera from the primary controlled entity, run the draw
    /// passes, present.
    fn render(&mut self, manager: &mut WorldLifecycleManager) -> Result<(), EngineError> {
        let (width, height) = self.surface.size();

        if let Some(parts) = manager.frame_parts() {
            prepare_camera(parts.world, width, height);
            parts.renderer.set_viewport(width, height);
            parts.renderer.render(parts.world)?;
        }

        self.stats.record(self.current_time - self.last_render);
        self.surface.swap_buffers();
        self.last_render = self.current_time;
        Ok(())
    }

    /// Drain the deferred task queue. A failing task is fatal: the error
    /// propagates and terminates the loop, but the queue is already empty,
    /// so no undone work leaks into a next frame that will never come.
    fn post_cycle(&mut self, manager: &mut WorldLifecycleManager) -> Result<(), EngineError> {
        if let Some(world) = manager.active_world_mut() {
            self.tasks.flush(world)?;
        }
        Ok(())
    }
}

/// Camera tracks an eye offset above the player's pivot: half the player's
/// vertical scale. Aspect comes from the reported viewport.
fn prepare_camera(world: &mut World, width: u32, height: u32) {
    world.camera.set_perspective();
    world.camera.set_aspect(width as f32 / height.max(1) as f32);
    if let Some(player) = world.player() {
        let head_offset = Vec3::new(0.0, player.transform.scale.y / 2.0, 0.0);
        let position = player.transform.position + head_offset;
        let orientation = player.transform.rotation;
        world.camera.set_position(position);
        world.camera.set_orientation(orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lifecycle::{NoHooks, WorldLifecycleManager};
    use crate::map::{MapError, MapLoader};
    use crate::window::HeadlessSurface;
    use prism_common::Key;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Clock fed an explicit schedule of poll results.
    struct ManualClock {
        times: Vec<f64>,
        index: usize,
    }

    impl ManualClock {
        fn new(times: &[f64]) -> Self {
            Self {
                times: times.to_vec(),
                index: 0,
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&mut self) -> TimeDelta {
            let t = self.times[self.index.min(self.times.len() - 1)];
            self.index += 1;
            TimeDelta::msec(t)
        }
    }

    struct EmptyMap;

    impl MapLoader for EmptyMap {
        fn load(&self, _path: &Path, _world: &mut World) -> Result<(), MapError> {
            Ok(())
        }
    }

    fn started_manager() -> WorldLifecycleManager {
        let mut mgr =
            WorldLifecycleManager::new(Config::default(), Box::new(NoHooks), Box::new(EmptyMap));
        mgr.start_initial_world().unwrap();
        mgr
    }

    #[test]
    fn elapsed_is_exact_difference_of_clock_polls() {
        let mut mgr = started_manager();

        struct DtProbe {
            seen: Rc<RefCell<Vec<f64>>>,
        }
        impl prism_kernel::Simulation for DtProbe {
            fn name(&self) -> &'static str {
                "dt_probe"
            }
            fn update(&mut self, _w: &mut World, dt: TimeDelta, _t: &DeferredTaskQueue) {
                self.seen.borrow_mut().push(dt.as_msec());
            }
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        mgr.active_world_mut()
            .unwrap()
            .transact()
            .add(DtProbe { seen: seen.clone() });

        // First poll 16ms after the zero origin, then a zero-length frame,
        // then a huge debugger-pause gap. None of it is clamped.
        let clock = ManualClock::new(&[16.0, 16.0, 5016.0]);
        let mut sched = FrameLoopScheduler::new(HeadlessSurface::new(640, 480), clock);
        sched.run_cycle(&mut mgr).unwrap();
        sched.run_cycle(&mut mgr).unwrap();
        sched.run_cycle(&mut mgr).unwrap();

        assert_eq!(*seen.borrow(), vec![16.0, 0.0, 5000.0]);
    }

    #[test]
    fn deferred_tasks_run_after_render_in_enqueue_order() {
        let mut mgr = started_manager();

        struct Enqueuer {
            order: Rc<RefCell<Vec<String>>>,
        }
        impl prism_kernel::Simulation for Enqueuer {
            fn name(&self) -> &'static str {
                "enqueuer"
            }
            fn update(&mut self, _w: &mut World, _dt: TimeDelta, tasks: &DeferredTaskQueue) {
                self.order.borrow_mut().push("update".into());
                for i in 0..3 {
                    let order = self.order.clone();
                    tasks.enqueue(move |_| {
                        order.borrow_mut().push(format!("task{i}"));
                        Ok(())
                    });
                }
            }
        }

        let order = Rc::new(RefCell::new(Vec::new()));
        mgr.active_world_mut()
            .unwrap()
            .transact()
            .add(Enqueuer { order: order.clone() });

        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(HeadlessSurface::new(640, 480), clock);
        sched.run_cycle(&mut mgr).unwrap();

        assert_eq!(
            *order.borrow(),
            vec!["update", "task0", "task1", "task2"]
        );
        // Render happened before the flush: the frame was presented.
        assert_eq!(sched.surface().frames_presented(), 1);
        // Nothing residual for the next cycle.
        assert!(sched.tasks().is_empty());
        sched.run_cycle(&mut mgr).unwrap();
        assert_eq!(order.borrow().iter().filter(|e| *e == "update").count(), 2);
        assert_eq!(order.borrow().len(), 8);
    }

    #[test]
    fn failing_deferred_task_terminates_the_loop() {
        let mut mgr = started_manager();

        struct Bomb;
        impl prism_kernel::Simulation for Bomb {
            fn name(&self) -> &'static str {
                "bomb"
            }
            fn update(&mut self, _w: &mut World, _dt: TimeDelta, tasks: &DeferredTaskQueue) {
                tasks.enqueue(|_| Err(prism_kernel::TaskFailure("corrupted".into())));
            }
        }

        mgr.active_world_mut().unwrap().transact().add(Bomb);

        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(HeadlessSurface::new(640, 480), clock);
        let err = sched.run(&mut mgr).unwrap_err();
        assert!(matches!(err, EngineError::DeferredTask(_)));
        // The frame that failed still rendered before its flush.
        assert_eq!(sched.surface().frames_presented(), 1);
        assert!(sched.tasks().is_empty());
    }

    #[test]
    fn camera_tracks_player_with_half_scale_eye_offset() {
        let mut mgr = started_manager();
        {
            let world = mgr.active_world_mut().unwrap();
            let player = world.player_mut().unwrap();
            player.transform.position = glam::Vec3::new(2.0, 0.0, -3.0);
            player.transform.scale = glam::Vec3::new(1.0, 1.8, 1.0);
        }

        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(HeadlessSurface::new(1280, 720), clock);
        sched.run_cycle(&mut mgr).unwrap();

        let camera = mgr.active_world().unwrap().camera;
        assert_eq!(camera.position, glam::Vec3::new(2.0, 0.9, -3.0));
        assert!((camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert!(camera.is_perspective());
    }

    #[test]
    fn close_request_finishes_the_current_cycle() {
        let mut mgr = started_manager();

        struct TaskEachFrame {
            flushes: Rc<RefCell<u32>>,
        }
        impl prism_kernel::Simulation for TaskEachFrame {
            fn name(&self) -> &'static str {
                "task_each_frame"
            }
            fn update(&mut self, _w: &mut World, _dt: TimeDelta, tasks: &DeferredTaskQueue) {
                let flushes = self.flushes.clone();
                tasks.enqueue(move |_| {
                    *flushes.borrow_mut() += 1;
                    Ok(())
                });
            }
        }

        let flushes = Rc::new(RefCell::new(0));
        mgr.active_world_mut()
            .unwrap()
            .transact()
            .add(TaskEachFrame { flushes: flushes.clone() });

        let mut surface = HeadlessSurface::new(640, 480);
        surface.close_after(2);
        let clock = ManualClock::new(&[16.0, 32.0]);
        let mut sched = FrameLoopScheduler::new(surface, clock);
        sched.run(&mut mgr).unwrap();

        // Two cycles ran; the one that saw the close request still rendered
        // and flushed its deferred work.
        assert_eq!(sched.surface().frames_presented(), 2);
        assert_eq!(*flushes.borrow(), 2);
        assert!(!sched.is_running());
    }

    #[test]
    fn quit_action_closes_the_loop() {
        let mut mgr = started_manager();
        let mut surface = HeadlessSurface::new(640, 480);
        surface.script_frame(vec![SurfaceEvent::KeyPressed(Key::Escape)]);
        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(surface, clock);
        sched.run(&mut mgr).unwrap();
        assert_eq!(sched.surface().frames_presented(), 1);
    }

    #[test]
    fn run_applies_cursor_mode_before_looping() {
        let mut mgr = started_manager();
        let mut surface = HeadlessSurface::new(640, 480);
        surface.close_after(1);
        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(surface, clock);
        sched.run(&mut mgr).unwrap();
        // Default config hides the cursor, so the mouse is locked.
        assert!(sched.surface().mouse_locked());
    }

    #[test]
    fn held_movement_keys_move_the_player_through_a_cycle() {
        let mut mgr = started_manager();
        let mut surface = HeadlessSurface::new(640, 480);
        surface.script_frame(vec![SurfaceEvent::KeyPressed(Key::W)]);
        let clock = ManualClock::new(&[0.0, 100.0]);
        let mut sched = FrameLoopScheduler::new(surface, clock);

        let before = mgr.active_world().unwrap().player().unwrap().transform.position;
        sched.run_cycle(&mut mgr).unwrap();
        sched.run_cycle(&mut mgr).unwrap();
        let after = mgr.active_world().unwrap().player().unwrap().transform.position;
        assert_ne!(before, after);
    }

    #[test]
    fn frame_stats_count_cycles() {
        let mut stats = FrameStats::new(4);
        stats.record(TimeDelta::msec(10.0));
        stats.record(TimeDelta::msec(30.0));
        assert_eq!(stats.cycles(), 2);
        assert_eq!(stats.average().as_msec(), 20.0);
        assert_eq!(stats.max().as_msec(), 30.0);
        assert!((stats.fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn frame_stats_window_wraps() {
        let mut stats = FrameStats::new(2);
        stats.record(TimeDelta::msec(10.0));
        stats.record(TimeDelta::msec(20.0));
        stats.record(TimeDelta::msec(30.0)); // overwrites the first
        assert_eq!(stats.cycles(), 3);
        assert_eq!(stats.average().as_msec(), 25.0);
    }

    #[test]
    fn scheduler_without_active_world_idles_and_honors_close() {
        let mut mgr =
            WorldLifecycleManager::new(Config::default(), Box::new(NoHooks), Box::new(EmptyMap));
        let mut surface = HeadlessSurface::new(640, 480);
        surface.close_after(1);
        let clock = ManualClock::new(&[16.0]);
        let mut sched = FrameLoopScheduler::new(surface, clock);
        sched.run(&mut mgr).unwrap();
        assert!(!sched.is_running());
    }
}
