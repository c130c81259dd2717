//! Frame cycle state machine.
//!
//! The loop itself does not own a timer: the host calls [`RenderLoop::tick`]
//! from its frame-synchronized callback and reschedules afterwards. Each tick
//! runs `update` before `render`, so controller damping always lands in the
//! frame that is drawn.

use foundation::time::Time;
use thiserror::Error;
use tracing::{debug, warn};

use crate::frame::{Frame, FrameClock};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    #[error("render loop is already running")]
    AlreadyRunning,
    #[error("render loop has not been started")]
    NotRunning,
}

/// Something driven once per frame.
pub trait FrameTarget {
    type Error: std::fmt::Display;

    /// Advance interactive state (camera controls, animations).
    fn update(&mut self, frame: Frame);

    /// Draw the current state.
    fn render(&mut self, frame: Frame) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    clock: FrameClock,
    render_failures: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            clock: FrameClock::new(),
            render_failures: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames run so far, including those whose render failed.
    pub fn frames_ticked(&self) -> u64 {
        self.clock.frames_elapsed()
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    /// Idle -> Running. There is no way back.
    pub fn start(&mut self) -> Result<(), LoopError> {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                debug!("render loop running");
                Ok(())
            }
            LoopState::Running => Err(LoopError::AlreadyRunning),
        }
    }

    /// Run one frame: update, then render.
    ///
    /// A failed render is logged and counted; it never stops the loop.
    pub fn tick<T: FrameTarget>(
        &mut self,
        timestamp_ms: f64,
        target: &mut T,
    ) -> Result<Frame, LoopError> {
        if self.state != LoopState::Running {
            return Err(LoopError::NotRunning);
        }

        let frame = self.clock.advance(Time::from_millis(timestamp_ms));
        target.update(frame);
        if let Err(err) = target.render(frame) {
            self.render_failures += 1;
            warn!(frame = frame.index, "render failed: {err}");
        }
        Ok(frame)
    }
}
