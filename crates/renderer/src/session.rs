//! One render session per set of [`RenderParameters`].
//!
//! A session owns the parameters, the time origin the shader measures
//! elapsed seconds from, and a [`CancelToken`]. The window cancels the token
//! when the parameters change or the window closes; a cancelled session never
//! touches its target again, even if a redraw callback was already queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::dpi::PhysicalSize;

use crate::error::SetupError;
use crate::gpu::LightningUniforms;
use crate::runtime::{BoxedTimeSource, TimeSample};
use crate::types::RenderParameters;

/// Shared flag that stops a session from drawing further frames.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Something a session can draw the lightning quad into.
///
/// The GPU state implements this over the swapchain. Keeping the seam narrow
/// lets the per-frame contract be checked without a device.
pub trait FrameTarget {
    type Error;

    /// Current backing-store size in physical pixels.
    fn backing_size(&self) -> PhysicalSize<u32>;

    /// Reallocates the backing store to `size`.
    fn resize(&mut self, size: PhysicalSize<u32>);

    /// Uploads `uniforms` and draws the six-vertex quad over the full backing store.
    fn draw(&mut self, uniforms: &LightningUniforms) -> Result<(), Self::Error>;
}

/// GPU resources a session is set up against.
///
/// Rebuilding replaces any previous program; on failure the host is left
/// with nothing to draw.
pub trait ProgramHost {
    fn rebuild_program(&mut self) -> Result<(), SetupError>;
}

/// What happened during one [`RenderSession::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The session was cancelled; the target was not touched.
    Cancelled,
    /// The displayed size is zero (minimised); nothing to draw into.
    Skipped,
    /// A frame was drawn with these uniform values.
    Drawn(LightningUniforms),
}

pub struct RenderSession {
    params: RenderParameters,
    time: BoxedTimeSource,
    token: CancelToken,
    last_sample: Option<TimeSample>,
}

impl RenderSession {
    /// Starts a session. The time source's origin is the session start.
    pub fn new(params: RenderParameters, mut time: BoxedTimeSource) -> Self {
        time.reset();
        tracing::debug!(
            hue = params.hue,
            x_offset = params.x_offset,
            speed = params.speed,
            intensity = params.intensity,
            size = params.size,
            "starting render session"
        );
        Self {
            params,
            time,
            token: CancelToken::new(),
            last_sample: None,
        }
    }

    /// Runs setup in order: parameters, graphics context, program.
    ///
    /// `context` is the outcome of acquiring the graphics context. The first
    /// failing step aborts setup and no session exists afterwards; nothing
    /// is retried until the caller asks for another session.
    pub fn setup<H: ProgramHost>(
        context: Result<&mut H, SetupError>,
        params: RenderParameters,
        time: BoxedTimeSource,
    ) -> Result<Self, SetupError> {
        params.validate()?;
        let host = context?;
        host.rebuild_program()?;
        Ok(Self::new(params, time))
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    /// Handle that can cancel this session from elsewhere.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn last_sample(&self) -> Option<TimeSample> {
        self.last_sample
    }

    /// Runs one iteration of the per-frame loop against `target`.
    ///
    /// `displayed` is the size the window is currently shown at. It is read
    /// once per frame by the caller and used for both the resync and the
    /// resolution uniform.
    pub fn frame<T: FrameTarget>(
        &mut self,
        target: &mut T,
        displayed: PhysicalSize<u32>,
    ) -> Result<FrameOutcome, T::Error> {
        if self.token.is_cancelled() {
            return Ok(FrameOutcome::Cancelled);
        }
        if displayed.width == 0 || displayed.height == 0 {
            return Ok(FrameOutcome::Skipped);
        }

        if target.backing_size() != displayed {
            tracing::trace!(
                width = displayed.width,
                height = displayed.height,
                "resyncing backing store to displayed size"
            );
            target.resize(displayed);
        }

        let sample = self.time.sample();
        self.last_sample = Some(sample);
        let uniforms = LightningUniforms::new(
            (displayed.width, displayed.height),
            sample.seconds,
            &self.params,
        );
        target.draw(&uniforms)?;
        Ok(FrameOutcome::Drawn(uniforms))
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
