//! Flat-earth affine projection pinned by two reference corners.
//!
//! Adequate for small rectangular regions where meridian convergence is
//! negligible.

use super::{Projection, ProjectionError};
use crate::core_types::{GeoPoint, Vec2};

/// A surface pixel paired with the geographic point drawn there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub x: f64,
    pub y: f64,
    pub geo: GeoPoint,
}

impl ReferencePoint {
    #[must_use]
    pub const fn new(x: f64, y: f64, geo: GeoPoint) -> Self {
        Self { x, y, geo }
    }
}

/// Affine map fixed by two reference corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearProjection {
    p0: ReferencePoint,
    /// Pixels per degree of longitude
    x_per_lng: f64,
    /// Pixels per degree of latitude (negative when north is up)
    y_per_lat: f64,
}

impl LinearProjection {
    /// Build the map from two opposite corners.
    ///
    /// # Errors
    /// Returns `ProjectionError::DegenerateReference` if the corners share an
    /// x, y, latitude or longitude value.
    pub fn new(p0: ReferencePoint, p1: ReferencePoint) -> Result<Self, ProjectionError> {
        let spans = [
            ("x", p1.x - p0.x),
            ("y", p1.y - p0.y),
            ("lat", p1.geo.lat - p0.geo.lat),
            ("lng", p1.geo.lng - p0.geo.lng),
        ];
        for (axis, span) in spans {
            if span == 0.0 || !span.is_finite() {
                return Err(ProjectionError::DegenerateReference { axis });
            }
        }
        Ok(Self {
            p0,
            x_per_lng: (p1.x - p0.x) / (p1.geo.lng - p0.geo.lng),
            y_per_lat: (p1.y - p0.y) / (p1.geo.lat - p0.geo.lat),
        })
    }

    /// Projection of a `width`×`height` surface whose top-left pixel shows
    /// `north_west` and bottom-right pixel shows `south_east`.
    ///
    /// # Errors
    /// Same as [`LinearProjection::new`].
    pub fn for_surface(
        width: u32,
        height: u32,
        north_west: GeoPoint,
        south_east: GeoPoint,
    ) -> Result<Self, ProjectionError> {
        Self::new(
            ReferencePoint::new(0.0, 0.0, north_west),
            ReferencePoint::new(f64::from(width), f64::from(height), south_east),
        )
    }
}

impl Projection for LinearProjection {
    fn project(&self, p: GeoPoint) -> Vec2 {
        let x = self.p0.x + (p.lng - self.p0.geo.lng) * self.x_per_lng;
        let y = self.p0.y + (p.lat - self.p0.geo.lat) * self.y_per_lat;
        Vec2::new(x as f32, y as f32)
    }

    fn unproject(&self, s: Vec2) -> GeoPoint {
        let lat = self.p0.geo.lat + (f64::from(s.y) - self.p0.y) / self.y_per_lat;
        let lng = self.p0.geo.lng + (f64::from(s.x) - self.p0.x) / self.x_per_lng;
        GeoPoint::new(lat, lng)
    }
}
