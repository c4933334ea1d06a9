//! Geographic wind data: raw grids and the lookup trait

pub mod vector_field;
pub mod wind_grid;

// Re-export main types
pub use vector_field::*;
pub use wind_grid::*;
