//! Still-frame rendering without a GPU.
//!
//! Frames are shaded with the CPU reference in [`crate::effect`] and encoded
//! as PNG. Channels are clamped to `[0, 1]` the same way a UNORM swapchain
//! saturates shader output.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::effect;
use crate::types::RenderParameters;

/// Shades every pixel of a `width` x `height` frame at `time` seconds.
///
/// Row 0 of the returned image is the top of the frame; the shader's
/// bottom-left fragment origin is flipped accordingly.
pub fn render_still(
    params: &RenderParameters,
    time: f32,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        bail!("still frame needs a non-zero size (got {width}x{height})");
    }
    params.validate()?;

    let resolution = Vec2::new(width as f32, height as f32);
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let frag_coord = Vec2::new(x as f32 + 0.5, height as f32 - (y as f32 + 0.5));
        let color = effect::shade(frag_coord, resolution, time, params);
        Rgba([
            to_unorm8(color.x),
            to_unorm8(color.y),
            to_unorm8(color.z),
            u8::MAX,
        ])
    });
    Ok(image)
}

/// Renders a still frame and writes it to `path` as PNG.
pub fn export_png(
    path: &Path,
    params: &RenderParameters,
    time: f32,
    width: u32,
    height: u32,
) -> Result<()> {
    let image = render_still(params, time, width, height)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width,
        height,
        time,
        "exported still frame"
    );
    Ok(())
}

fn to_unorm8(channel: f32) -> u8 {
    if channel.is_nan() {
        return 0;
    }
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
