//! GPU side of the lightning renderer.
//!
//! - `context` owns the wgpu instance, surface, device and queue, and knows
//!   how to reconfigure the swapchain when the backing size changes.
//! - `pipeline` turns the validated GLSL program into a render pipeline with
//!   the static quad and the uniform slot.
//! - `uniforms` mirrors the shader's uniform block.
//! - `state` glues them together and implements
//!   [`FrameTarget`](crate::session::FrameTarget) for the window.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
pub use uniforms::LightningUniforms;
