//! Colour types and the two wind-speed colour scales
//!
//! - [`ColorScale`]: continuous extended-sinebow ramp for the mask wash
//! - [`StrokePalette`]: discrete greyscale buckets for particle trails

pub mod palette;
pub mod sinebow;

pub use palette::StrokePalette;
pub use sinebow::{sinebow, ColorScale, SINEBOW_BOUNDARY};

use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour, not premultiplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn grey(level: u8) -> Self {
        Self::new(level, level, level, 255)
    }

    /// Same colour with `a` replaced by `alpha` in `[0, 1]`
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: unit_to_byte(alpha),
            ..self
        }
    }

    /// Alpha as a fraction in `[0, 1]`
    #[must_use]
    pub fn alpha(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// CSS `rgba(r, g, b, a)` string for canvas backends that take styles
    #[must_use]
    pub fn to_css(self) -> String {
        let a = self.alpha();
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, trim_float(a))
    }

    #[must_use]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Map `[0, 1]` onto `0..=255`, rounding to nearest
#[must_use]
pub fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn trim_float(value: f32) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}
