//! Configuration for a streamline layer
//!
//! One immutable `StreamlineConfig` is built per layer. Device-dependent
//! tweaks (retina displays) are derived up front with
//! [`StreamlineConfig::for_device_pixel_ratio`] instead of patching shared
//! constants at runtime, so several overlays can coexist.

use crate::color::{unit_to_byte, Rgba, StrokePalette};
use crate::field::{MaskOptions, SampleOptions};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default simulation constants
pub mod defaults {
    /// Particles per unit of visible area, before density
    pub const PARTICLE_MULTIPLIER: f32 = 7.0;
    /// Frames a particle lives before it is respawned
    pub const MAX_PARTICLE_AGE: u32 = 100;
    /// Delay between frames (ms), about 25 fps
    pub const FRAME_PERIOD_MS: u64 = 40;
    pub const PARTICLE_LINE_WIDTH: f32 = 1.0;
    /// Opacity of freshly stroked trail segments
    pub const TRAIL_ALPHA: f32 = 0.9;
    /// Trail retention per frame; half-life ≈ ln(0.5)/ln(0.97) ≈ 23 frames
    pub const FADE_ALPHA: f32 = 0.97;
    /// Square pixels per particle unit
    pub const PARTICLE_AREA_DIVISOR: f32 = 1200.0;
    /// Particle count above which the dampening factor applies
    pub const DAMPENING_THRESHOLD: usize = 5000;
    pub const DAMPENING_FACTOR: f32 = 0.7;
    /// Grey level step between stroke buckets
    pub const STROKE_STEP: u8 = 10;
    /// Wind speed mapped to the brightest stroke bucket
    pub const STROKE_MAX_WIND: f32 = 17.0;
    /// Velocity scale for zoom levels without a table entry
    pub const VELOCITY_SCALE: f32 = 0.1;
}

/// Pixels-per-frame displacement per unit of wind, keyed by zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityScale {
    levels: FxHashMap<u8, f32>,
    fallback: f32,
}

impl Default for VelocityScale {
    /// Table covering zoom 5 to 10, the range regional wind products are
    /// usually viewed at.
    fn default() -> Self {
        let levels = [(5, 0.06), (6, 0.08), (7, 0.1), (8, 0.12), (9, 0.15), (10, 0.2)];
        Self {
            levels: levels.into_iter().collect(),
            fallback: defaults::VELOCITY_SCALE,
        }
    }
}

impl VelocityScale {
    /// Same scale at every zoom
    #[must_use]
    pub fn uniform(scale: f32) -> Self {
        Self {
            levels: FxHashMap::default(),
            fallback: scale,
        }
    }

    /// Override the scale for one zoom level
    #[must_use]
    pub fn with_level(mut self, zoom: u8, scale: f32) -> Self {
        self.levels.insert(zoom, scale);
        self
    }

    #[must_use]
    pub fn for_zoom(&self, zoom: u8) -> f32 {
        self.levels.get(&zoom).copied().unwrap_or(self.fallback)
    }
}

/// Immutable per-layer animation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamlineConfig {
    pub particle_multiplier: f32,
    pub max_particle_age: u32,
    pub frame_period_ms: u64,
    pub line_width: f32,
    pub fade_alpha: f32,
    pub trail_alpha: f32,
    pub particle_area_divisor: f32,
    pub dampening_threshold: usize,
    pub dampening_factor: f32,
    pub stroke_step: u8,
    pub stroke_max_wind: f32,
    /// Colour wash under the particles; `None` disables the mask
    pub mask: Option<MaskOptions>,
    /// Flip `v` so north-up wind maps onto y-down pixels
    pub invert_v: bool,
    /// Device pixels per logical pixel
    pub retina_scale: f32,
    pub velocity_scale: VelocityScale,
}

impl Default for StreamlineConfig {
    fn default() -> Self {
        Self {
            particle_multiplier: defaults::PARTICLE_MULTIPLIER,
            max_particle_age: defaults::MAX_PARTICLE_AGE,
            frame_period_ms: defaults::FRAME_PERIOD_MS,
            line_width: defaults::PARTICLE_LINE_WIDTH,
            fade_alpha: defaults::FADE_ALPHA,
            trail_alpha: defaults::TRAIL_ALPHA,
            particle_area_divisor: defaults::PARTICLE_AREA_DIVISOR,
            dampening_threshold: defaults::DAMPENING_THRESHOLD,
            dampening_factor: defaults::DAMPENING_FACTOR,
            stroke_step: defaults::STROKE_STEP,
            stroke_max_wind: defaults::STROKE_MAX_WIND,
            mask: Some(MaskOptions::default()),
            invert_v: true,
            retina_scale: 1.0,
            velocity_scale: VelocityScale::default(),
        }
    }
}

impl StreamlineConfig {
    /// Variant for a display with `dpr` device pixels per CSS pixel.
    ///
    /// Each logical pixel covers `dpr` device pixels, so the unprojection
    /// divides by it and trails are drawn `dpr` times wider.
    #[must_use]
    pub fn for_device_pixel_ratio(self, dpr: f32) -> Self {
        if !(dpr.is_finite() && dpr > 1.0) {
            return self;
        }
        Self {
            retina_scale: dpr,
            line_width: self.line_width * dpr,
            ..self
        }
    }

    /// Particle population for a `width`×`height` surface.
    ///
    /// Proportional to area and `density`; large counts are damped so very
    /// big viewports stay affordable.
    #[must_use]
    pub fn particle_count(&self, width: u32, height: u32, density: f32) -> usize {
        let area = f64::from(width) * f64::from(height);
        let mut count = area / f64::from(self.particle_area_divisor)
            * f64::from(density.max(0.0))
            * f64::from(self.particle_multiplier);
        if count > self.dampening_threshold as f64 {
            count *= f64::from(self.dampening_factor);
        }
        count.round() as usize
    }

    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }

    /// Fill used with destination-in compositing to fade trails
    #[must_use]
    pub fn fade_color(&self) -> Rgba {
        Rgba::new(0, 0, 0, unit_to_byte(self.fade_alpha))
    }

    #[must_use]
    pub fn palette(&self) -> StrokePalette {
        StrokePalette::greyscale(self.stroke_step, self.stroke_max_wind)
            .with_alpha(self.trail_alpha)
    }

    #[must_use]
    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            invert_v: self.invert_v,
            mask: self.mask,
        }
    }
}
