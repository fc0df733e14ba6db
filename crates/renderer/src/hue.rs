use crate::types::HERO_HUE;

/// Native stand-in for the hero section's hue slider.
///
/// Values are quantised to `step` and clamped to `[min, max]`. The control
/// only reports whether the value changed; the window decides what a change
/// means for the running session.
#[derive(Debug, Clone, PartialEq)]
pub struct HueControl {
    min: f32,
    max: f32,
    step: f32,
    value: f32,
    dragging: bool,
}

impl Default for HueControl {
    fn default() -> Self {
        Self::new(HERO_HUE)
    }
}

impl HueControl {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 360.0;
    pub const STEP: f32 = 1.0;
    /// Steps moved by PageUp/PageDown.
    pub const PAGE: i32 = 10;

    /// Starts at `initial`, wrapped into the range the way the shader wraps
    /// hue, so the control shows the colour actually drawn.
    pub fn new(initial: f32) -> Self {
        let mut control = Self {
            min: Self::MIN,
            max: Self::MAX,
            step: Self::STEP,
            value: Self::MIN,
            dragging: false,
        };
        control.value = control.quantise(Self::wrap(initial));
        control
    }

    fn wrap(hue: f32) -> f32 {
        (hue - Self::MIN).rem_euclid(Self::MAX - Self::MIN) + Self::MIN
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Sets the value to an absolute hue. Returns `true` if it changed.
    pub fn set(&mut self, hue: f32) -> bool {
        let next = self.quantise(hue);
        if next == self.value {
            return false;
        }
        self.value = next;
        true
    }

    /// Maps a track position in `[0, 1]` onto the range.
    pub fn set_from_fraction(&mut self, fraction: f32) -> bool {
        if !fraction.is_finite() {
            return false;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.set(self.min + fraction * (self.max - self.min))
    }

    /// Moves by `steps` increments, saturating at either end.
    pub fn nudge(&mut self, steps: i32) -> bool {
        self.set(self.value + steps as f32 * self.step)
    }

    pub fn set_min(&mut self) -> bool {
        self.set(self.min)
    }

    pub fn set_max(&mut self) -> bool {
        self.set(self.max)
    }

    fn quantise(&self, hue: f32) -> f32 {
        if !hue.is_finite() {
            return self.value;
        }
        let steps = ((hue - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_hero_hue() {
        let control = HueControl::default();
        assert_eq!(control.value(), 220.0);
        assert!(!control.is_dragging());
    }

    #[test]
    fn initial_hue_wraps_like_the_shader() {
        let mut control = HueControl::new(400.0);
        assert_eq!(control.value(), 40.0);
        assert!(control.nudge(-1));
        assert_eq!(control.value(), 39.0);

        assert_eq!(HueControl::new(-30.0).value(), 330.0);
        assert_eq!(HueControl::new(360.0).value(), 0.0);
        assert_eq!(HueControl::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn values_are_quantised_and_clamped() {
        let mut control = HueControl::default();
        assert!(control.set(12.4));
        assert_eq!(control.value(), 12.0);
        assert!(control.set(-40.0));
        assert_eq!(control.value(), 0.0);
        assert!(control.set(900.0));
        assert_eq!(control.value(), 360.0);
        assert!(!control.set(f32::NAN));
        assert_eq!(control.value(), 360.0);
    }

    #[test]
    fn fraction_maps_across_track() {
        let mut control = HueControl::default();
        assert!(control.set_from_fraction(0.0));
        assert_eq!(control.value(), 0.0);
        assert!(control.set_from_fraction(0.5));
        assert_eq!(control.value(), 180.0);
        assert!(control.set_from_fraction(1.5));
        assert_eq!(control.value(), 360.0);
        assert!(!control.set_from_fraction(1.0));
    }

    #[test]
    fn nudge_saturates_at_bounds() {
        let mut control = HueControl::new(359.0);
        assert!(control.nudge(1));
        assert_eq!(control.value(), 360.0);
        assert!(!control.nudge(1));

        assert!(control.nudge(-HueControl::PAGE));
        assert_eq!(control.value(), 350.0);

        assert!(control.set_min());
        assert!(!control.nudge(-1));
        assert_eq!(control.value(), 0.0);
        assert!(control.set_max());
        assert_eq!(control.value(), 360.0);
    }

    #[test]
    fn unchanged_value_reports_no_change() {
        let mut control = HueControl::new(100.0);
        assert!(!control.set(100.3));
        assert_eq!(control.value(), 100.0);
    }
}
