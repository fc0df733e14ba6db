use std::path::PathBuf;
use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames should animate continuously,
/// be evaluated at a fixed timestamp, or be exported to disk.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop on every display refresh, optionally capped.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Hold a single still frame in the window at a fixed timestamp.
    Still {
        /// Timestamp to evaluate the shader at (seconds).
        time: f32,
    },
    /// Render one frame without a window and write it to disk as PNG.
    Export {
        /// Timestamp to evaluate the shader at (seconds).
        time: f32,
        /// Destination path for the exported file.
        path: PathBuf,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed time since the session started, in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
///
/// The origin is captured on construction, which is the session start
/// timestamp the shader's elapsed time is measured from.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time, frame: 0 }
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a fresh time source for one render session.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Still { time } | RenderPolicy::Export { time, .. } => {
            Box::new(FixedTimeSource::new(*time))
        }
    }
}

/// Decides when the window should request the next redraw.
///
/// Uncapped animation redraws on every vsync callback. A capped policy spaces
/// frames by `1 / fps`, and a still policy draws until one frame landed.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    continuous: bool,
    last_frame: Option<Instant>,
    rendered_once: bool,
}

impl FrameScheduler {
    pub fn new(policy: &RenderPolicy) -> Self {
        match policy {
            RenderPolicy::Animate { target_fps } => Self {
                interval: target_fps
                    .filter(|fps| fps.is_finite() && *fps > 0.0)
                    .map(|fps| Duration::from_secs_f32(1.0 / fps)),
                continuous: true,
                last_frame: None,
                rendered_once: false,
            },
            RenderPolicy::Still { .. } | RenderPolicy::Export { .. } => Self {
                interval: None,
                continuous: false,
                last_frame: None,
                rendered_once: false,
            },
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if !self.continuous {
            return !self.rendered_once;
        }
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.continuous {
            return None;
        }
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => Some(last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.rendered_once = true;
    }

    /// Forget frame history so the next session draws immediately.
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.rendered_once = false;
    }
}
