//! Vector type alias for surface positions and pixel velocities.

use nalgebra::Vector2;

/// 2D vector type for canvas positions and per-frame displacements.
///
/// This is a simple alias for `nalgebra::Vector2<f32>`, used throughout
/// the engine for surface points, particle positions and sampled wind.
pub type Vec2 = Vector2<f32>;
