use bytemuck::{Pod, Zeroable};

use crate::types::RenderParameters;

/// CPU mirror of the `LightningParams` std140 block.
///
/// `vec2` sits at offset 0 and the six floats pack behind it, so the Rust
/// layout matches std140 without explicit padding (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightningUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub hue: f32,
    pub x_offset: f32,
    pub speed: f32,
    pub intensity: f32,
    pub size: f32,
}

impl LightningUniforms {
    pub fn new(resolution: (u32, u32), time: f32, params: &RenderParameters) -> Self {
        Self {
            resolution: [resolution.0 as f32, resolution.1 as f32],
            time,
            hue: params.hue,
            x_offset: params.x_offset,
            speed: params.speed,
            intensity: params.intensity,
            size: params.size,
        }
    }

    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(LightningUniforms::SIZE, 32);
        assert_eq!(offset_of!(LightningUniforms, resolution), 0);
        assert_eq!(offset_of!(LightningUniforms, time), 8);
        assert_eq!(offset_of!(LightningUniforms, hue), 12);
        assert_eq!(offset_of!(LightningUniforms, x_offset), 16);
        assert_eq!(offset_of!(LightningUniforms, speed), 20);
        assert_eq!(offset_of!(LightningUniforms, intensity), 24);
        assert_eq!(offset_of!(LightningUniforms, size), 28);
    }

    #[test]
    fn new_copies_parameters_and_resolution() {
        let params = RenderParameters {
            hue: 12.0,
            x_offset: -0.5,
            speed: 3.0,
            intensity: 0.25,
            size: 4.0,
        };
        let uniforms = LightningUniforms::new((640, 480), 1.5, &params);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.hue, 12.0);
        assert_eq!(uniforms.x_offset, -0.5);
        assert_eq!(uniforms.speed, 3.0);
        assert_eq!(uniforms.intensity, 0.25);
        assert_eq!(uniforms.size, 4.0);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 32);
    }
}
