//! Spherical Mercator (EPSG:3857) tied to a zoom level and pixel origin.
//!
//! World pixel coordinates follow the usual slippy-map convention: the
//! whole world is `256 · 2^zoom` pixels wide, (0, 0) is the north-west
//! corner and y grows southward. A surface pixel is offset by the view's
//! pixel origin and divided by the retina scale before unprojecting.
//!
//! ```text
//! mx  = (px / scale - 0.5) · 2πR
//! my  = (0.5 - py / scale) · 2πR
//! lat = (2·atan(exp(my / R)) - π/2) · 180/π
//! lng = mx / R · 180/π
//! ```

use super::{Projection, ProjectionError};
use crate::core_types::{GeoPoint, Vec2};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Earth radius used by spherical Mercator (m)
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Width of one tile in world pixels at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Mercator square is cut off (degrees)
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Mercator projection for one view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    zoom: f64,
    /// World pixel shown at surface (0, 0)
    origin: (f64, f64),
    /// Device pixels per logical pixel
    retina_scale: f64,
    /// `256 · 2^zoom`
    world_scale: f64,
}

impl MercatorProjection {
    /// # Errors
    /// Returns `ProjectionError::InvalidParameter` for a non-finite zoom or
    /// origin, or a retina scale that is not strictly positive.
    pub fn new(zoom: f64, origin: (f64, f64), retina_scale: f64) -> Result<Self, ProjectionError> {
        if !zoom.is_finite() {
            return Err(ProjectionError::InvalidParameter {
                name: "zoom",
                value: zoom,
            });
        }
        for (name, value) in [("origin.x", origin.0), ("origin.y", origin.1)] {
            if !value.is_finite() {
                return Err(ProjectionError::InvalidParameter { name, value });
            }
        }
        if !(retina_scale.is_finite() && retina_scale > 0.0) {
            return Err(ProjectionError::InvalidParameter {
                name: "retina_scale",
                value: retina_scale,
            });
        }
        Ok(Self {
            zoom,
            origin,
            retina_scale,
            world_scale: TILE_SIZE * zoom.exp2(),
        })
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn world_scale(&self) -> f64 {
        self.world_scale
    }

    /// Latitude shown on surface row `y`
    #[must_use]
    pub fn unproject_lat(&self, y: f64) -> f64 {
        let py = self.origin.1 + y / self.retina_scale;
        let my = (0.5 - py / self.world_scale) * 2.0 * PI * EARTH_RADIUS;
        (2.0 * (my / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees()
    }

    /// Longitude shown on surface column `x`
    #[must_use]
    pub fn unproject_lng(&self, x: f64) -> f64 {
        let px = self.origin.0 + x / self.retina_scale;
        let mx = (px / self.world_scale - 0.5) * 2.0 * PI * EARTH_RADIUS;
        (mx / EARTH_RADIUS).to_degrees()
    }

    /// World pixel of a geographic point (before origin/retina offset)
    #[must_use]
    pub fn world_pixel(&self, p: GeoPoint) -> (f64, f64) {
        let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let mx = EARTH_RADIUS * p.lng.to_radians();
        let my = EARTH_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln();
        let k = 1.0 / (2.0 * PI * EARTH_RADIUS);
        (
            (mx * k + 0.5) * self.world_scale,
            (0.5 - my * k) * self.world_scale,
        )
    }
}

impl Projection for MercatorProjection {
    fn project(&self, p: GeoPoint) -> Vec2 {
        let (px, py) = self.world_pixel(p);
        Vec2::new(
            ((px - self.origin.0) * self.retina_scale) as f32,
            ((py - self.origin.1) * self.retina_scale) as f32,
        )
    }

    fn unproject(&self, s: Vec2) -> GeoPoint {
        GeoPoint::new(
            self.unproject_lat(f64::from(s.y)),
            self.unproject_lng(f64::from(s.x)),
        )
    }
}
