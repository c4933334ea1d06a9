//! Vector field trait definition
//!
//! The sampling stage only needs "give me the wind at this lat/lng", so
//! it is written against this trait rather than a concrete grid type.

use crate::core_types::{GeoBounds, GeoPoint, WindVector};

/// Geographic wind lookup.
///
/// Implementations must be `Send + Sync` because `SampledField::build`
/// samples rows in parallel.
pub trait VectorField: Send + Sync {
    /// Wind at `p`, or `None` when the point is outside the covered area or
    /// the data there is missing. Never panics for any input.
    fn lookup(&self, p: GeoPoint) -> Option<WindVector>;

    /// Rectangle the field covers
    fn bounds(&self) -> GeoBounds;
}

/// Uniform wind everywhere inside `bounds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantField {
    pub wind: WindVector,
    pub bounds: GeoBounds,
}

impl VectorField for ConstantField {
    fn lookup(&self, p: GeoPoint) -> Option<WindVector> {
        self.bounds.contains(p).then_some(self.wind)
    }

    fn bounds(&self) -> GeoBounds {
        self.bounds
    }
}
