//! Wind vectors.
//!
//! Missing data is modelled as `Option<WindVector>`: a lookup that has no
//! value returns `None` and every consumer treats that as a first-class
//! outcome. A `WindVector` itself is always finite.

use serde::{Deserialize, Serialize};

/// Horizontal wind with eastward `u` and northward `v` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindVector {
    pub u: f32,
    pub v: f32,
}

impl WindVector {
    #[must_use]
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// Build a vector from raw components, rejecting NaN/infinite input.
    ///
    /// Raw grids mark holes with NaN, so this is the single point where
    /// "no data" enters the `Option` world.
    #[must_use]
    pub fn from_components(u: f32, v: f32) -> Option<Self> {
        (u.is_finite() && v.is_finite()).then_some(Self { u, v })
    }

    /// Wind speed, `sqrt(u² + v²)`
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.u.hypot(self.v)
    }

    /// Scale both components by the same factor
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.u * factor, self.v * factor)
    }
}
