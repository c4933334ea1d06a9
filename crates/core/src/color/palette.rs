//! Discrete greyscale stroke palette.
//!
//! Particles are batched by colour so that each frame issues one path per
//! bucket instead of one per particle.

use super::Rgba;

/// Darkest grey level of the palette
const FIRST_LEVEL: u16 = 85;

/// Greyscale buckets from level 85 up to 255, indexed by wind speed.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePalette {
    colors: Vec<Rgba>,
    max_wind: f32,
}

impl StrokePalette {
    /// Palette with grey levels `85, 85 + step, ..` up to 255; speeds at or
    /// above `max_wind` share the brightest bucket.
    #[must_use]
    pub fn greyscale(step: u8, max_wind: f32) -> Self {
        let step = u16::from(step.max(1));
        let colors = (FIRST_LEVEL..=255)
            .step_by(usize::from(step))
            .map(|level| Rgba::grey(level as u8))
            .collect();
        Self {
            colors,
            max_wind: if max_wind > 0.0 { max_wind } else { 1.0 },
        }
    }

    /// Same buckets stroked at opacity `alpha`
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            colors: self.colors.into_iter().map(|c| c.with_alpha(alpha)).collect(),
            ..self
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    #[must_use]
    pub fn color(&self, index: usize) -> Rgba {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// `floor(min(m, max) / max · (len - 1))`
    #[must_use]
    pub fn index_for(&self, magnitude: f32) -> usize {
        if magnitude.is_nan() || magnitude <= 0.0 {
            return 0;
        }
        let clamped = magnitude.min(self.max_wind);
        (clamped / self.max_wind * (self.colors.len() - 1) as f32).floor() as usize
    }

    /// CSS strings for every bucket, in index order
    #[must_use]
    pub fn css_styles(&self) -> Vec<String> {
        self.colors.iter().copied().map(Rgba::to_css).collect()
    }
}
