//! Raw wind grid as delivered by a data source
//!
//! A `WindGrid` holds `u`/`v` components on a regular latitude/longitude
//! lattice in row-major order. Holes in the dataset are stored as NaN and
//! surface as `None` from every accessor.

use crate::core_types::{GeoBounds, GeoPoint, WindVector};
use crate::grid::VectorField;
use serde::{Deserialize, Serialize};

/// Direction in which grid rows advance.
///
/// GRIB products usually start at the northernmost row, but nothing forces
/// a source to do so; the orientation is therefore stated, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowOrder {
    /// Row 0 is the northernmost row; latitude decreases with the row index
    #[default]
    NorthToSouth,
    /// Row 0 is the southernmost row; latitude increases with the row index
    SouthToNorth,
}

/// Shape and placement of a wind grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Number of columns (longitude samples)
    pub nlng: usize,
    /// Number of rows (latitude samples)
    pub nlat: usize,
    /// Geographic position of cell (0, 0)
    pub origin: GeoPoint,
    /// Latitude spacing between rows in degrees (positive)
    pub dlat: f64,
    /// Longitude spacing between columns in degrees (positive)
    pub dlng: f64,
    pub row_order: RowOrder,
}

impl GridLayout {
    /// Rectangle covered by the grid vertices
    #[must_use]
    pub fn bounds(&self) -> GeoBounds {
        let lat_span = self.dlat * (self.nlat.saturating_sub(1)) as f64;
        let lng_span = self.dlng * (self.nlng.saturating_sub(1)) as f64;
        let far_lat = match self.row_order {
            RowOrder::NorthToSouth => self.origin.lat - lat_span,
            RowOrder::SouthToNorth => self.origin.lat + lat_span,
        };
        GeoBounds::from_corners(
            self.origin,
            GeoPoint::new(far_lat, self.origin.lng + lng_span),
        )
    }

    /// Fractional (column, row) position of a point in grid units
    fn grid_coords(&self, p: GeoPoint) -> (f64, f64) {
        let fx = (p.lng - self.origin.lng) / self.dlng;
        let fy = match self.row_order {
            RowOrder::NorthToSouth => (self.origin.lat - p.lat) / self.dlat,
            RowOrder::SouthToNorth => (p.lat - self.origin.lat) / self.dlat,
        };
        (fx, fy)
    }

    fn validate(&self) -> Result<(), GridError> {
        if self.nlng == 0 || self.nlat == 0 {
            return Err(GridError::EmptyGrid {
                nlng: self.nlng,
                nlat: self.nlat,
            });
        }
        if !(self.dlat.is_finite() && self.dlat > 0.0) {
            return Err(GridError::InvalidCellSize {
                axis: "dlat",
                value: self.dlat,
            });
        }
        if !(self.dlng.is_finite() && self.dlng > 0.0) {
            return Err(GridError::InvalidCellSize {
                axis: "dlng",
                value: self.dlng,
            });
        }
        if !self.origin.is_finite() {
            return Err(GridError::InvalidOrigin(self.origin));
        }
        Ok(())
    }
}

/// Errors raised while assembling a wind grid
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// One of the dimensions is zero
    EmptyGrid { nlng: usize, nlat: usize },
    /// Cell spacing is zero, negative or not finite
    InvalidCellSize { axis: &'static str, value: f64 },
    /// Origin has a NaN or infinite coordinate
    InvalidOrigin(GeoPoint),
    /// A component array does not hold `nlng * nlat` values
    DataLength {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::EmptyGrid { nlng, nlat } => {
                write!(f, "Grid must have at least one cell, got {nlng}x{nlat}")
            }
            GridError::InvalidCellSize { axis, value } => {
                write!(f, "Cell size {axis} must be finite and positive, got {value}")
            }
            GridError::InvalidOrigin(p) => {
                write!(f, "Grid origin must be finite, got ({}, {})", p.lat, p.lng)
            }
            GridError::DataLength {
                component,
                expected,
                actual,
            } => write!(
                f,
                "Component '{component}' has {actual} values, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Regular lat/lng grid of wind vectors
///
/// Deserialisation goes through [`WindGrid::new`], so a payload with a bad
/// layout or mismatched component lengths is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawWindGrid", into = "RawWindGrid")]
pub struct WindGrid {
    layout: GridLayout,
    u: Vec<f32>,
    v: Vec<f32>,
    bounds: GeoBounds,
}

/// Serialised form of a [`WindGrid`]; bounds are always recomputed
#[derive(Serialize, Deserialize)]
struct RawWindGrid {
    layout: GridLayout,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl TryFrom<RawWindGrid> for WindGrid {
    type Error = GridError;

    fn try_from(raw: RawWindGrid) -> Result<Self, GridError> {
        WindGrid::new(raw.layout, raw.u, raw.v)
    }
}

impl From<WindGrid> for RawWindGrid {
    fn from(grid: WindGrid) -> Self {
        Self {
            layout: grid.layout,
            u: grid.u,
            v: grid.v,
        }
    }
}

impl WindGrid {
    /// Create a grid from row-major component arrays.
    ///
    /// # Errors
    /// Returns `GridError` if the layout is degenerate or either component
    /// array has the wrong length.
    pub fn new(layout: GridLayout, u: Vec<f32>, v: Vec<f32>) -> Result<Self, GridError> {
        layout.validate()?;
        let expected = layout.nlng * layout.nlat;
        for (component, len) in [("u", u.len()), ("v", v.len())] {
            if len != expected {
                return Err(GridError::DataLength {
                    component,
                    expected,
                    actual: len,
                });
            }
        }
        Ok(Self {
            bounds: layout.bounds(),
            layout,
            u,
            v,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Vector stored at column `x`, row `y`, or `None` for holes and
    /// out-of-range indices
    #[must_use]
    pub fn vector(&self, x: usize, y: usize) -> Option<WindVector> {
        if x >= self.layout.nlng || y >= self.layout.nlat {
            return None;
        }
        let n = self.layout.nlng * y + x;
        WindVector::from_components(self.u[n], self.v[n])
    }

    /// Raw vector of the cell whose centre is nearest to `p`
    #[must_use]
    pub fn grid_vector(&self, p: GeoPoint) -> Option<WindVector> {
        if !self.bounds.contains(p) {
            return None;
        }
        let (fx, fy) = self.layout.grid_coords(p);
        let x = ((fx + 0.5).floor() as usize).min(self.layout.nlng - 1);
        let y = ((fy + 0.5).floor() as usize).min(self.layout.nlat - 1);
        self.vector(x, y)
    }

    /// Bilinearly interpolated vector at `p`.
    ///
    /// Returns `None` outside the grid rectangle and whenever any of the
    /// four enclosing vertices is a hole.
    #[must_use]
    pub fn interpolate(&self, p: GeoPoint) -> Option<WindVector> {
        if !self.bounds.contains(p) {
            return None;
        }
        let (fx, fy) = self.layout.grid_coords(p);
        let (x0, dx) = split_cell(fx, self.layout.nlng);
        let (y0, dy) = split_cell(fy, self.layout.nlat);
        // Neighbours past the last vertex only ever carry zero weight.
        let x1 = (x0 + 1).min(self.layout.nlng - 1);
        let y1 = (y0 + 1).min(self.layout.nlat - 1);

        Some(bilinear(
            dx as f32,
            dy as f32,
            self.vector(x0, y0)?,
            self.vector(x1, y0)?,
            self.vector(x0, y1)?,
            self.vector(x1, y1)?,
        ))
    }
}

impl VectorField for WindGrid {
    fn lookup(&self, p: GeoPoint) -> Option<WindVector> {
        self.interpolate(p)
    }

    fn bounds(&self) -> GeoBounds {
        self.bounds
    }
}

/// Split a fractional grid coordinate into a cell index and the offset
/// within that cell, both clamped to the grid.
fn split_cell(f: f64, n: usize) -> (usize, f64) {
    let last = n - 1;
    let cell = f.floor().max(0.0) as usize;
    if cell >= last {
        return (last, 0.0);
    }
    (cell, (f - cell as f64).clamp(0.0, 1.0))
}

/// Blend four corner vectors with weights `(1-dx)(1-dy)`, `dx(1-dy)`,
/// `(1-dx)dy` and `dx·dy`.
#[must_use]
pub fn bilinear(
    dx: f32,
    dy: f32,
    p00: WindVector,
    p10: WindVector,
    p01: WindVector,
    p11: WindVector,
) -> WindVector {
    let rx = 1.0 - dx;
    let ry = 1.0 - dy;
    let a = rx * ry;
    let b = dx * ry;
    let c = rx * dy;
    let d = dx * dy;
    WindVector::new(
        p00.u * a + p10.u * b + p01.u * c + p11.u * d,
        p00.v * a + p10.v * b + p01.v * c + p11.v * d,
    )
}
