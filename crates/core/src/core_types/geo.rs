//! Geographic coordinates and rectangular extents.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in degrees.
///
/// Stored as `f64` so that Mercator world-pixel coordinates keep sub-pixel
/// precision at high zoom levels (`256 * 2^18` exceeds what `f32` can hold
/// exactly).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Axis-aligned latitude/longitude rectangle (inclusive on every edge).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Build bounds from any two opposite corners.
    #[must_use]
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            south: a.lat.min(b.lat),
            west: a.lng.min(b.lng),
            north: a.lat.max(b.lat),
            east: a.lng.max(b.lng),
        }
    }

    /// Inclusive containment test. Latitude and longitude are checked
    /// independently, and a NaN coordinate is never contained.
    #[must_use]
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }

    #[must_use]
    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    #[must_use]
    pub fn south_east(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.east)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_any_corner_order() {
        let a = GeoBounds::from_corners(GeoPoint::new(35.0, 130.0), GeoPoint::new(33.0, 133.0));
        let b = GeoBounds::from_corners(GeoPoint::new(33.0, 133.0), GeoPoint::new(35.0, 130.0));
        assert_eq!(a, b);
        assert_eq!(a.north_west(), GeoPoint::new(35.0, 130.0));
        assert_eq!(a.south_east(), GeoPoint::new(33.0, 133.0));
    }

    #[test]
    fn test_contains_edges_and_nan() {
        let bounds =
            GeoBounds::from_corners(GeoPoint::new(35.0, 130.0), GeoPoint::new(33.0, 133.0));
        assert!(bounds.contains(GeoPoint::new(35.0, 130.0)));
        assert!(bounds.contains(GeoPoint::new(33.0, 133.0)));
        assert!(!bounds.contains(GeoPoint::new(35.01, 131.0)));
        assert!(!bounds.contains(GeoPoint::new(34.0, 133.01)));
        assert!(!bounds.contains(GeoPoint::new(f64::NAN, 131.0)));
    }
}
