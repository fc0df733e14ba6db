//! CPU mirror of the lightning fragment shader.
//!
//! Every function here has a GLSL twin in [`crate::shader`] and follows it
//! operation for operation, so the properties of the effect (determinism,
//! time/size scaling, colour range) can be checked without a GPU. The still
//! exporter also renders through this module.
//!
//! Coordinates follow the HTML canvas convention: `frag_coord` has its
//! origin in the bottom-left corner and pixel centres at `.5`.

use glam::{Mat2, Vec2, Vec3};

use crate::types::RenderParameters;

/// Number of noise octaves summed by [`fbm`].
pub const OCTAVE_COUNT: u32 = 10;
/// Rotation applied to the sampling coordinate between octaves (radians).
pub const OCTAVE_ROTATION: f32 = 0.45;
/// Upper bound of the flicker term.
pub const FLICKER_MAX: f32 = 0.07;
/// Fixed saturation of the bolt colour.
pub const SATURATION: f32 = 0.7;
/// Fixed value (brightness) of the bolt colour.
pub const VALUE: f32 = 0.8;
/// Time multiplier applied to the noise sampling offset.
pub const DRIFT: f32 = 0.8;
/// Lower bound for the distance to the warped centreline.
///
/// Pixels exactly on the centreline would otherwise divide by zero; with the
/// clamp they saturate to a large finite value.
pub const DIST_EPSILON: f32 = 1.0e-4;

fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// GLSL `mod`: the result takes the sign of `y`.
fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

fn smoothstep01(x: f32) -> f32 {
    let t = x.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Standard HSV to RGB conversion with all components in `[0, 1]`.
///
/// The hue wraps, so `h = 1.25` gives the same colour as `h = 0.25`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let channel = |offset: f32| {
        let k = glsl_mod(h * 6.0 + offset, 6.0);
        ((k - 3.0).abs() - 1.0).clamp(0.0, 1.0)
    };
    let rgb = Vec3::new(channel(0.0), channel(4.0), channel(2.0));
    v * Vec3::ONE.lerp(rgb, s)
}

/// Base colour of the bolt for a hue in degrees.
pub fn base_color(hue_degrees: f32) -> Vec3 {
    hsv_to_rgb(hue_degrees / 360.0, SATURATION, VALUE)
}

/// One-dimensional hash into `[0, 1)`.
pub fn hash11(p: f32) -> f32 {
    let mut p = fract(p * 0.1031);
    p *= p + 33.33;
    p *= p + p;
    fract(p)
}

/// Two-dimensional hash into `[0, 1)`.
pub fn hash12(p: Vec2) -> f32 {
    let mut p3 = Vec3::new(p.x, p.y, p.x) * 0.1031;
    p3 = Vec3::new(fract(p3.x), fract(p3.y), fract(p3.z));
    let shifted = Vec3::new(p3.y, p3.z, p3.x) + Vec3::splat(33.33);
    p3 += Vec3::splat(p3.dot(shifted));
    fract((p3.x + p3.y) * p3.z)
}

/// Matrix matching GLSL `mat2(c, -s, s, c)` (column-major).
pub fn rotate2d(theta: f32) -> Mat2 {
    let (s, c) = theta.sin_cos();
    Mat2::from_cols(Vec2::new(c, -s), Vec2::new(s, c))
}

/// Bilinearly interpolated value noise over the unit grid.
pub fn noise(p: Vec2) -> f32 {
    let ip = p.floor();
    let fp = p - ip;
    let a = hash12(ip);
    let b = hash12(ip + Vec2::new(1.0, 0.0));
    let c = hash12(ip + Vec2::new(0.0, 1.0));
    let d = hash12(ip + Vec2::new(1.0, 1.0));

    let tx = smoothstep01(fp.x);
    let ty = smoothstep01(fp.y);
    mix(mix(a, b, tx), mix(c, d, tx), ty)
}

/// Fractal Brownian motion: `octaves` layers of [`noise`], each rotated by
/// [`OCTAVE_ROTATION`], at double the frequency and half the amplitude of the
/// previous one.
pub fn fbm(mut p: Vec2, octaves: u32) -> f32 {
    let rotation = rotate2d(OCTAVE_ROTATION);
    let mut value = 0.0;
    let mut amplitude = 0.5;
    for _ in 0..octaves {
        value += amplitude * noise(p);
        // GLSL `p *= m` multiplies the row vector from the left.
        p = rotation.transpose() * p;
        p *= 2.0;
        amplitude *= 0.5;
    }
    value
}

/// Maps a fragment coordinate to aspect-corrected `[-1, 1]` space and applies
/// the horizontal offset.
pub fn normalized_coordinate(frag_coord: Vec2, resolution: Vec2, x_offset: f32) -> Vec2 {
    let mut uv = frag_coord / resolution;
    uv = 2.0 * uv - Vec2::ONE;
    uv.x *= resolution.x / resolution.y;
    uv.x += x_offset;
    uv
}

/// Point at which the noise field is sampled for a normalised coordinate.
pub fn noise_coordinate(uv: Vec2, time: f32, params: &RenderParameters) -> Vec2 {
    uv * params.size + Vec2::splat(DRIFT * time * params.speed)
}

/// Displacement added to both axes of the normalised coordinate, in `[-1, 1]`.
pub fn displacement(uv: Vec2, time: f32, params: &RenderParameters) -> f32 {
    2.0 * fbm(noise_coordinate(uv, time, params), OCTAVE_COUNT) - 1.0
}

/// Distance of the warped coordinate from the vertical centreline.
pub fn centerline_distance(uv: Vec2, time: f32, params: &RenderParameters) -> f32 {
    let warped = uv + Vec2::splat(displacement(uv, time, params));
    warped.x.abs()
}

/// Brightness falloff around the bolt. `dist` is clamped to [`DIST_EPSILON`].
pub fn bolt_color(hue_degrees: f32, flicker: f32, dist: f32, intensity: f32) -> Vec3 {
    let dist = dist.max(DIST_EPSILON);
    base_color(hue_degrees) * (flicker / dist) * intensity
}

/// Flicker scalar in `[0, FLICKER_MAX]`.
pub fn flicker(time: f32, speed: f32) -> f32 {
    mix(0.0, FLICKER_MAX, hash11(time * speed))
}

/// Colour of one fragment. Alpha is always 1 and therefore omitted.
pub fn shade(frag_coord: Vec2, resolution: Vec2, time: f32, params: &RenderParameters) -> Vec3 {
    let uv = normalized_coordinate(frag_coord, resolution, params.x_offset);
    let dist = centerline_distance(uv, time, params);
    let color = bolt_color(
        params.hue,
        flicker(time, params.speed),
        dist,
        params.intensity,
    );
    // Identity power curve, kept so the output matches the shader exactly.
    color.powf(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1.0e-5;

    fn reference_hsv(h: f32, s: f32, v: f32) -> Vec3 {
        let h = h.rem_euclid(1.0) * 6.0;
        let c = v * s;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Vec3::new(r + m, g + m, b + m)
    }

    #[test]
    fn hsv_matches_textbook_formula_over_full_hue_range() {
        for degrees in 0..360 {
            let color = base_color(degrees as f32);
            let expected = reference_hsv(degrees as f32 / 360.0, SATURATION, VALUE);
            for channel in color.to_array() {
                assert!((0.0..=VALUE + TOLERANCE).contains(&channel));
            }
            assert!(
                color.abs_diff_eq(expected, 1.0e-4),
                "hue {degrees}: got {color:?}, expected {expected:?}"
            );
        }
    }

    #[test]
    fn hue_wraps_periodically() {
        let base = base_color(40.0);
        assert!(base.abs_diff_eq(base_color(400.0), 1.0e-4));
        assert!(base.abs_diff_eq(base_color(-320.0), 1.0e-4));
    }

    #[test]
    fn primary_hues_land_on_expected_channels() {
        let red = base_color(0.0);
        assert!((red.x - VALUE).abs() < TOLERANCE);
        assert!((red.y - VALUE * (1.0 - SATURATION)).abs() < TOLERANCE);
        let blue = base_color(240.0);
        assert!((blue.z - VALUE).abs() < TOLERANCE);
    }

    #[test]
    fn hashes_stay_in_unit_interval() {
        for i in -200..200 {
            let x = i as f32 * 0.37;
            let h = hash11(x);
            assert!((0.0..=1.0).contains(&h));
            let h2 = hash12(Vec2::new(x, -x * 1.7));
            assert!((0.0..=1.0).contains(&h2));
        }
    }

    #[test]
    fn fbm_is_deterministic() {
        let p = Vec2::new(0.318, -1.27);
        let first = fbm(p, OCTAVE_COUNT);
        for _ in 0..8 {
            assert_eq!(fbm(p, OCTAVE_COUNT).to_bits(), first.to_bits());
        }
        assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn fbm_with_zero_octaves_is_zero() {
        assert_eq!(fbm(Vec2::new(3.0, 4.0), 0), 0.0);
    }

    #[test]
    fn rotation_matches_glsl_row_vector_product() {
        let m = rotate2d(OCTAVE_ROTATION);
        let p = Vec2::new(1.0, 0.0);
        let rotated = m.transpose() * p;
        let (s, c) = OCTAVE_ROTATION.sin_cos();
        // p * mat2(c, -s, s, c) = (dot(p, col0), dot(p, col1)) = (c, s).
        assert!((rotated.x - c).abs() < TOLERANCE);
        assert!((rotated.y - s).abs() < TOLERANCE);
    }

    #[test]
    fn doubling_size_doubles_sampling_frequency() {
        let small = RenderParameters::default();
        let large = RenderParameters {
            size: 2.0,
            ..small
        };
        for &(x, y) in &[(0.1, 0.2), (-0.7, 0.45), (0.93, -0.12)] {
            let uv = Vec2::new(x, y);
            assert_eq!(
                noise_coordinate(uv, 0.0, &large),
                noise_coordinate(uv * 2.0, 0.0, &small)
            );
            assert_eq!(
                displacement(uv, 0.0, &large).to_bits(),
                displacement(uv * 2.0, 0.0, &small).to_bits()
            );
        }
    }

    #[test]
    fn doubling_speed_matches_doubling_time() {
        let normal = RenderParameters::default();
        let fast = RenderParameters {
            speed: 2.0,
            ..normal
        };
        let resolution = Vec2::new(320.0, 180.0);
        for &t in &[0.25_f32, 1.5, 7.0] {
            for &(x, y) in &[(10.5, 20.5), (160.5, 90.5), (300.5, 170.5)] {
                let frag = Vec2::new(x, y);
                let a = shade(frag, resolution, t, &fast);
                let b = shade(frag, resolution, 2.0 * t, &normal);
                assert_eq!(a, b, "t = {t}, frag = {frag:?}");
            }
        }
    }

    #[test]
    fn flicker_is_bounded() {
        for i in 0..500 {
            let f = flicker(i as f32 * 0.016, 1.0);
            assert!((0.0..=FLICKER_MAX).contains(&f));
        }
    }

    #[test]
    fn centerline_fragment_saturates_instead_of_faulting() {
        let on_line = bolt_color(0.0, FLICKER_MAX, 0.0, 1.0);
        assert!(on_line.is_finite());
        assert_eq!(on_line, bolt_color(0.0, FLICKER_MAX, DIST_EPSILON, 1.0));
        assert_eq!(on_line, bolt_color(0.0, FLICKER_MAX, -0.0, 1.0));

        let params = RenderParameters {
            hue: 0.0,
            ..RenderParameters::default()
        };
        let resolution = Vec2::new(2.0, 2.0);
        let centre = shade(Vec2::new(1.0, 1.0), resolution, 0.0, &params);
        assert!(centre.is_finite());
    }

    #[test]
    fn intensity_scales_brightness_linearly() {
        let params = RenderParameters::default();
        let doubled = RenderParameters {
            intensity: 2.0,
            ..params
        };
        let resolution = Vec2::new(64.0, 64.0);
        let frag = Vec2::new(12.5, 40.5);
        let a = shade(frag, resolution, 0.75, &params);
        let b = shade(frag, resolution, 0.75, &doubled);
        assert!((b - 2.0 * a).abs().max_element() <= 1.0e-5 * b.max_element().max(1.0));
    }

    #[test]
    fn normalized_coordinate_corrects_aspect_ratio() {
        let resolution = Vec2::new(200.0, 100.0);
        let uv = normalized_coordinate(Vec2::new(200.0, 100.0), resolution, 0.0);
        assert!((uv.x - 2.0).abs() < TOLERANCE);
        assert!((uv.y - 1.0).abs() < TOLERANCE);
        let shifted = normalized_coordinate(Vec2::new(100.0, 50.0), resolution, 0.5);
        assert!((shifted.x - 0.5).abs() < TOLERANCE);
    }
}
