//! Gate that keeps the per-frame work off until the model is loaded.
//!
//! The loop starts [`LoopState::Idle`]. The first successful model load moves it
//! to [`LoopState::Running`], which it never leaves. A failed load is reported
//! through the diagnostic callback and the loop stays idle for good, so no frame
//! is ever rasterized in that session.

use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// The two steps of a frame, in the order the loop calls them.
pub trait Frame {
    /// Advance the damped camera motion and the plane animation by one step.
    fn update_controls(&mut self);

    /// Draw the scene from the camera.
    fn rasterize(&mut self);
}

pub type Diagnostics = Box<dyn FnMut(&anyhow::Error)>;

pub struct RenderLoop {
    state: LoopState,
    on_error: Diagnostics,
    frames: u64,
    failed: bool,
}

impl RenderLoop {
    /// A loop that reports load failures with `log::error!`.
    pub fn new() -> Self {
        Self::with_diagnostics(Box::new(|e: &anyhow::Error| {
            log::error!("An error happened while loading the model: {:#}", e);
        }))
    }

    pub fn with_diagnostics(on_error: Diagnostics) -> Self {
        Self {
            state: LoopState::Idle,
            on_error,
            frames: 0,
            failed: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Feeds the result of the model load into the gate.
    ///
    /// Returns the model when it should be added to the scene. Only the first
    /// success starts the loop; later results are dropped with a warning.
    pub fn resolve_model<T>(&mut self, result: anyhow::Result<T>) -> Option<T> {
        match (self.state, result) {
            (LoopState::Idle, Ok(_)) if self.failed => {
                log::warn!("Ignoring a model load after a failed one, the render loop stays idle");
                None
            }
            (LoopState::Idle, Ok(model)) => {
                log::info!("Model loaded, starting the render loop");
                self.state = LoopState::Running;
                Some(model)
            }
            (LoopState::Running, Ok(_)) => {
                log::warn!("Ignoring a second model load, the render loop is already running");
                None
            }
            (state, Err(e)) => {
                self.failed |= state == LoopState::Idle;
                (self.on_error)(&e);
                None
            }
        }
    }

    /// Runs one frame if the loop is running. Returns whether anything ran.
    pub fn frame<F: Frame + ?Sized>(&mut self, frame: &mut F) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        frame.update_controls();
        frame.rasterize();
        self.frames += 1;
        true
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state)
            .field("frames", &self.frames)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use anyhow::anyhow;

    use super::*;

    #[derive(Default)]
    struct Spy {
        calls: Vec<&'static str>,
    }

    impl Frame for Spy {
        fn update_controls(&mut self) {
            self.calls.push("controls");
        }

        fn rasterize(&mut self) {
            self.calls.push("rasterize");
        }
    }

    #[test]
    fn idle_loop_does_nothing() {
        let mut render_loop = RenderLoop::new();
        let mut spy = Spy::default();
        assert!(!render_loop.frame(&mut spy));
        assert!(spy.calls.is_empty());
    }

    #[test]
    fn success_starts_the_loop_once() {
        let mut render_loop = RenderLoop::new();
        assert_eq!(render_loop.resolve_model(Ok(7)), Some(7));
        assert_eq!(render_loop.state(), LoopState::Running);
        assert_eq!(render_loop.resolve_model(Ok(8)), None);

        let mut spy = Spy::default();
        assert!(render_loop.frame(&mut spy));
        assert!(render_loop.frame(&mut spy));
        assert_eq!(spy.calls, ["controls", "rasterize", "controls", "rasterize"]);
        assert_eq!(render_loop.frames(), 2);
    }

    #[test]
    fn failure_is_reported_and_keeps_the_loop_idle() {
        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = reported.clone();
        let mut render_loop = RenderLoop::with_diagnostics(Box::new(move |e: &anyhow::Error| {
            sink.borrow_mut().push(format!("{:#}", e));
        }));

        let result: anyhow::Result<()> = Err(anyhow!("no such file"));
        assert_eq!(render_loop.resolve_model(result), None);
        assert_eq!(render_loop.state(), LoopState::Idle);
        assert_eq!(reported.borrow().as_slice(), ["no such file"]);

        let mut spy = Spy::default();
        for _ in 0..3 {
            render_loop.frame(&mut spy);
        }
        assert!(spy.calls.is_empty());
    }

    #[test]
    fn failure_after_start_does_not_stop_the_loop() {
        let mut render_loop = RenderLoop::with_diagnostics(Box::new(|_: &anyhow::Error| {}));
        render_loop.resolve_model(Ok(()));
        render_loop.resolve_model::<()>(Err(anyhow!("late failure")));
        assert_eq!(render_loop.state(), LoopState::Running);
    }

    #[test]
    fn success_after_failure_keeps_the_loop_idle() {
        let mut render_loop = RenderLoop::with_diagnostics(Box::new(|_: &anyhow::Error| {}));
        render_loop.resolve_model::<()>(Err(anyhow!("no such file")));
        assert_eq!(render_loop.resolve_model(Ok(())), None);
        assert_eq!(render_loop.state(), LoopState::Idle);

        let mut spy = Spy::default();
        assert!(!render_loop.frame(&mut spy));
        assert!(spy.calls.is_empty());
    }
}
