//! Renderer crate for Lightning.
//!
//! Draws an animated, procedurally generated lightning bolt with a single
//! fragment program over a full-surface quad. The overall flow is:
//!
//! ```text
//!   CLI / lightning
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ RenderSession::frame()
//!          │                 │                                   │
//!          │                 └─ hue change: cancel + rebuild     └─▶ GpuState (FrameTarget)
//!          └─▶ still::export_png (Export policy, CPU only)
//! ```
//!
//! `GpuState` owns the surface, device and pipeline. A `RenderSession` lives
//! for exactly one set of [`RenderParameters`]: changing any parameter cancels
//! the session and rebuilds the program from scratch. The `effect` module is a
//! line-for-line CPU mirror of the fragment program, used for still export and
//! for checking the shading properties without a GPU.

pub mod effect;
pub mod error;
mod gpu;
pub mod hue;
pub mod runtime;
pub mod session;
pub mod shader;
pub mod still;
pub mod types;
mod window;

use anyhow::{Context, Result};

pub use error::{SetupError, Stage};
pub use gpu::LightningUniforms;
pub use hue::HueControl;
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, RenderPolicy,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use session::{CancelToken, FrameOutcome, FrameTarget, ProgramHost, RenderSession};
pub use types::{
    Antialiasing, ColorSpaceMode, ParameterError, RenderParameters, RendererConfig, HERO_HUE,
};

/// Thin entry point that picks between the window and a still export.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Runs until the window closes, or until the still frame is written.
    pub fn run(self) -> Result<()> {
        if let RenderPolicy::Export { time, path } = &self.config.policy {
            let (width, height) = self.config.surface_size;
            return still::export_png(path, &self.config.parameters, *time, width, height)
                .with_context(|| format!("failed to export still frame to {}", path.display()));
        }
        window::run(self.config)
    }
}
