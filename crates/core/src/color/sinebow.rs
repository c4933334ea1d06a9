//! Extended sinebow colour ramp.
//!
//! Below [`SINEBOW_BOUNDARY`] the value sweeps hue around a sinebow (5/6 of
//! a turn, at 3/4 frequency, so both ends stay distinguishable). Above it
//! the ramp fades linearly from the sinebow's end colour to white, which
//! keeps very strong winds readable without wrapping back to red.

use super::Rgba;
use std::f32::consts::TAU;

/// Fraction of the scale spent on the hue sweep
pub const SINEBOW_BOUNDARY: f32 = 0.45;

/// Sinebow colour for `hue` in `[0, 1]`, as floating RGB in `0..=255`.
#[must_use]
pub fn sinebow(hue: f32) -> [f32; 3] {
    let rad = hue * TAU * 5.0 / 6.0 * 0.75;
    let s = rad.sin();
    let c = rad.cos();
    [
        (-c).max(0.0) * 255.0,
        s.max(0.0) * 255.0,
        c.max(0.0).max(-s) * 255.0,
    ]
}

/// Continuous colour scale over normalised magnitudes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    boundary: f32,
    /// Sinebow colour at the boundary, start of the fade
    fade_start: [f32; 3],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorScale {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: SINEBOW_BOUNDARY,
            fade_start: sinebow(1.0),
        }
    }

    /// Colour for `value` (clamped to `[0, 1]`) with alpha byte `alpha`.
    ///
    /// NaN maps to the start of the scale.
    #[must_use]
    pub fn color_for(&self, value: f32, alpha: u8) -> Rgba {
        let i = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let [r, g, b] = if i <= self.boundary {
            sinebow(i / self.boundary)
        } else {
            let t = (i - self.boundary) / (1.0 - self.boundary);
            let [r0, g0, b0] = self.fade_start;
            [
                r0 * (1.0 - t) + 255.0 * t,
                g0 * (1.0 - t) + 255.0 * t,
                b0 * (1.0 - t) + 255.0 * t,
            ]
        };
        Rgba::new(r.floor() as u8, g.floor() as u8, b.floor() as u8, alpha)
    }
}
