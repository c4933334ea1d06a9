//! Geographic <-> surface coordinate transforms
//!
//! Projections are small `Copy` values. The layer builds a fresh one for
//! every view update (zoom and pixel origin change on each pan/zoom), so
//! nothing that consumes a `Projection` ever has to be reconstructed.

pub mod linear;
pub mod mercator;

pub use linear::{LinearProjection, ReferencePoint};
pub use mercator::{MercatorProjection, EARTH_RADIUS, MAX_LATITUDE, TILE_SIZE};

use crate::core_types::{GeoPoint, Vec2};

/// Maps between geographic coordinates and output pixels.
pub trait Projection: Send + Sync {
    /// Geographic point to surface pixel
    fn project(&self, p: GeoPoint) -> Vec2;

    /// Surface pixel to geographic point
    fn unproject(&self, s: Vec2) -> GeoPoint;
}

/// Errors raised when a projection cannot be parameterised
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Reference corners coincide on one axis, so the affine map is singular
    DegenerateReference { axis: &'static str },
    /// A parameter is NaN, infinite or out of its valid range
    InvalidParameter { name: &'static str, value: f64 },
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::DegenerateReference { axis } => {
                write!(f, "Reference corners have zero span along {axis}")
            }
            ProjectionError::InvalidParameter { name, value } => {
                write!(f, "Projection parameter {name} is invalid: {value}")
            }
        }
    }
}

impl std::error::Error for ProjectionError {}
