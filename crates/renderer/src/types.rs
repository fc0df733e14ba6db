use crate::runtime::RenderPolicy;

/// Hue used by the hero section when nobody has touched the slider yet.
pub const HERO_HUE: f32 = 220.0;

/// The five scalars that drive the lightning shader.
///
/// A value of this type lives exactly as long as one render session. Changing
/// any field produces a new value, and the window tears the running session
/// down and starts a fresh one rather than patching uniforms in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParameters {
    /// Hue in degrees. Values outside `[0, 360)` wrap periodically.
    pub hue: f32,
    /// Horizontal shift of the bolt in normalised coordinates.
    pub x_offset: f32,
    /// Multiplier on animation time.
    pub speed: f32,
    /// Multiplier on output brightness.
    pub intensity: f32,
    /// Multiplier on the spatial frequency of the noise field.
    pub size: f32,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            hue: 230.0,
            x_offset: 0.0,
            speed: 1.0,
            intensity: 1.0,
            size: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("render parameter `{name}` must be finite (got {value})")]
    NotFinite { name: &'static str, value: f32 },
}

impl RenderParameters {
    /// Parameters as the hero section instantiates them: a faster, dimmer
    /// bolt with twice the noise frequency of the bare defaults.
    pub fn hero() -> Self {
        Self {
            hue: HERO_HUE,
            x_offset: 0.0,
            speed: 1.6,
            intensity: 0.6,
            size: 2.0,
        }
    }

    pub fn with_hue(self, hue: f32) -> Self {
        Self { hue, ..self }
    }

    /// Field names paired with their values, in uniform block order.
    pub fn fields(&self) -> [(&'static str, f32); 5] {
        [
            ("hue", self.hue),
            ("x_offset", self.x_offset),
            ("speed", self.speed),
            ("intensity", self.intensity),
            ("size", self.size),
        ]
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(ParameterError::NotFinite { name, value });
            }
        }
        Ok(())
    }
}

/// Anti-aliasing policy for the render pipeline.
///
/// The effect is one full-window quad with no interior geometry edges, so
/// multisampling is off unless asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count the surface format supports, up to 4.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    #[default]
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Match the browser canvas: shader output is written as-is to a non-sRGB swapchain.
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Initial shader parameters. The window may replace the hue later.
    pub parameters: RenderParameters,
    /// Whether to animate, hold a still frame, or export one to disk.
    pub policy: RenderPolicy,
    pub antialiasing: Antialiasing,
    pub color_space: ColorSpaceMode,
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            parameters: RenderParameters::hero(),
            policy: RenderPolicy::default(),
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            title: "Lightning".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_props() {
        let params = RenderParameters::default();
        assert_eq!(params.hue, 230.0);
        assert_eq!(params.x_offset, 0.0);
        assert_eq!(params.speed, 1.0);
        assert_eq!(params.intensity, 1.0);
        assert_eq!(params.size, 1.0);
    }

    #[test]
    fn hero_matches_call_site() {
        let hero = RenderParameters::hero();
        assert_eq!(hero.hue, HERO_HUE);
        assert_eq!(hero.x_offset, 0.0);
        assert_eq!((hero.speed, hero.intensity, hero.size), (1.6, 0.6, 2.0));
        assert!(hero.validate().is_ok());
    }

    #[test]
    fn multisampling_is_off_by_default() {
        assert_eq!(Antialiasing::default(), Antialiasing::Off);
        assert_eq!(RendererConfig::default().antialiasing, Antialiasing::Off);
    }

    #[test]
    fn validate_rejects_non_finite_fields() {
        let params = RenderParameters {
            speed: f32::NAN,
            ..RenderParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, ParameterError::NotFinite { name: "speed", .. }));

        let params = RenderParameters::default().with_hue(f32::INFINITY);
        assert!(params.validate().is_err());
    }

    #[test]
    fn out_of_range_hue_is_still_valid() {
        assert!(RenderParameters::default().with_hue(-90.0).validate().is_ok());
        assert!(RenderParameters::default().with_hue(720.0).validate().is_ok());
    }

    #[test]
    fn with_hue_changes_identity() {
        let base = RenderParameters::hero();
        let changed = base.with_hue(100.0);
        assert_ne!(base, changed);
        assert_eq!(changed.speed, base.speed);
    }
}
