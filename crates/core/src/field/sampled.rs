//! Half-resolution sampled wind field.
//!
//! Built once per view update by unprojecting every second pixel in both
//! axes and looking the wind up in the geographic field. Each sampled value
//! stands for the 2×2 pixel block whose top-left corner it was taken at.
//! The animation reads this grid on every frame and never writes to it; a
//! view change produces a brand-new `SampledField`.

use super::mask::{mask_color, ColorMask, MaskOptions};
use crate::color::ColorScale;
use crate::core_types::Vec2;
use crate::grid::VectorField;
use crate::projection::Projection;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

/// Placement attempts before `randomize` settles for an undefined cell
pub const RANDOMIZE_ATTEMPTS: u32 = 30;

/// Wind at one sampled cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Displacement in pixels per frame (scaled, screen-oriented)
    pub velocity: Vec2,
    /// Unscaled wind speed
    pub magnitude: f32,
}

/// How geographic wind is turned into screen motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    /// Flip `v` so that northward wind moves particles up the screen
    pub invert_v: bool,
    /// Build a colour mask alongside the vectors
    pub mask: Option<MaskOptions>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            invert_v: true,
            mask: None,
        }
    }
}

/// Outcome of a random placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    /// Whether the chosen cell carries data
    pub defined: bool,
    /// Candidates drawn, at most [`RANDOMIZE_ATTEMPTS`]
    pub attempts: u32,
}

/// Dense wind grid in surface space
#[derive(Debug, Clone)]
pub struct SampledField {
    width: u32,
    height: u32,
    cols: usize,
    rows: usize,
    cells: Vec<Option<FieldSample>>,
    mask: Option<ColorMask>,
}

impl SampledField {
    /// Sample `field` through `projection` over a `width`×`height` surface.
    ///
    /// `scale` converts wind units into pixels per frame.
    pub fn build(
        field: &dyn VectorField,
        projection: &dyn Projection,
        width: u32,
        height: u32,
        scale: f32,
        options: &SampleOptions,
    ) -> Self {
        let cols = (width as usize).div_ceil(2);
        let rows = (height as usize).div_ceil(2);
        let mut cells = vec![None; cols * rows];

        if cols > 0 {
            let v_sign = if options.invert_v { -1.0 } else { 1.0 };
            cells
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(row, out)| {
                    let y = (row * 2) as f32;
                    for (col, cell) in out.iter_mut().enumerate() {
                        let geo = projection.unproject(Vec2::new((col * 2) as f32, y));
                        *cell = field.lookup(geo).map(|wind| FieldSample {
                            velocity: Vec2::new(wind.u * scale, wind.v * scale * v_sign),
                            magnitude: wind.magnitude(),
                        });
                    }
                });
        }

        let mask = options
            .mask
            .map(|mask_options| build_mask(&cells, cols, width, height, &mask_options));

        let sampled = Self {
            width,
            height,
            cols,
            rows,
            cells,
            mask,
        };
        debug!(
            "Sampled field rebuilt: {}x{} px, {}x{} cells, {} defined",
            width,
            height,
            cols,
            rows,
            sampled.defined_cells()
        );
        sampled
    }

    /// Field with no data anywhere
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        let cols = (width as usize).div_ceil(2);
        let rows = (height as usize).div_ceil(2);
        Self {
            width,
            height,
            cols,
            rows,
            cells: vec![None; cols * rows],
            mask: None,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (columns, rows) of the sampled grid
    #[must_use]
    pub fn grid_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[must_use]
    pub fn mask(&self) -> Option<&ColorMask> {
        self.mask.as_ref()
    }

    /// Sample nearest to pixel (x, y), or `None` outside the surface or
    /// where there is no data
    #[must_use]
    pub fn get(&self, x: f32, y: f32) -> Option<FieldSample> {
        let px = x.round();
        let py = y.round();
        if !(px >= 0.0 && py >= 0.0 && px < self.width as f32 && py < self.height as f32) {
            return None;
        }
        let col = px as usize / 2;
        let row = py as usize / 2;
        self.cells[row * self.cols + col]
    }

    #[must_use]
    pub fn is_defined(&self, x: f32, y: f32) -> bool {
        self.get(x, y).is_some()
    }

    /// Number of sampled cells that carry data
    #[must_use]
    pub fn defined_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Uniformly random pixel, preferring one with data.
    ///
    /// Draws at most [`RANDOMIZE_ATTEMPTS`] candidates and keeps the last one
    /// even if it is undefined, so sparse or empty fields still return in
    /// bounded time.
    pub fn randomize<R: Rng + ?Sized>(&self, rng: &mut R) -> Placement {
        if self.width == 0 || self.height == 0 {
            return Placement {
                position: Vec2::zeros(),
                defined: false,
                attempts: 0,
            };
        }
        let mut attempts = 0;
        loop {
            attempts += 1;
            let x = rng.random_range(0..self.width) as f32;
            let y = rng.random_range(0..self.height) as f32;
            let defined = self.is_defined(x, y);
            if defined || attempts >= RANDOMIZE_ATTEMPTS {
                return Placement {
                    position: Vec2::new(x, y),
                    defined,
                    attempts,
                };
            }
        }
    }
}

fn build_mask(
    cells: &[Option<FieldSample>],
    cols: usize,
    width: u32,
    height: u32,
    options: &MaskOptions,
) -> ColorMask {
    let scale = ColorScale::new();
    let stride = width as usize * 4;
    let mut pixels = vec![0u8; stride * height as usize];
    if stride > 0 {
        pixels.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            let cell_row = &cells[(y / 2) * cols..(y / 2 + 1) * cols];
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let color = mask_color(&scale, cell_row[x / 2].map(|s| s.magnitude), options);
                px.copy_from_slice(&color.to_array());
            }
        });
    }
    ColorMask::from_pixels(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{GeoBounds, GeoPoint, WindVector};
    use crate::grid::ConstantField;
    use crate::projection::LinearProjection;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn projection() -> LinearProjection {
        LinearProjection::for_surface(
            40,
            30,
            GeoPoint::new(35.0, 130.0),
            GeoPoint::new(33.0, 133.0),
        )
        .unwrap()
    }

    /// Wind only over the western half of the surface
    fn half_field() -> ConstantField {
        ConstantField {
            wind: WindVector::new(3.0, 4.0),
            bounds: GeoBounds::from_corners(GeoPoint::new(35.0, 130.0), GeoPoint::new(33.0, 131.5)),
        }
    }

    #[test]
    fn test_build_scales_and_inverts() {
        let sampled = SampledField::build(
            &half_field(),
            &projection(),
            40,
            30,
            0.5,
            &SampleOptions::default(),
        );
        assert_eq!(sampled.grid_size(), (20, 15));
        let s = sampled.get(4.0, 4.0).unwrap();
        assert_relative_eq!(s.velocity.x, 1.5);
        assert_relative_eq!(s.velocity.y, -2.0);
        assert_relative_eq!(s.magnitude, 5.0);
        assert!(sampled.get(30.0, 4.0).is_none());
    }

    #[test]
    fn test_two_by_two_blocks_share_a_sample() {
        let options = SampleOptions {
            invert_v: false,
            mask: None,
        };
        let sampled = SampledField::build(&half_field(), &projection(), 40, 30, 1.0, &options);
        assert_eq!(sampled.get(2.0, 2.0), sampled.get(3.0, 3.0));
        assert_eq!(sampled.get(2.0, 2.0), sampled.get(3.4, 2.4));
        assert_relative_eq!(sampled.get(2.0, 2.0).unwrap().velocity.y, 4.0);
    }

    #[test]
    fn test_out_of_range_is_undefined() {
        let sampled = SampledField::build(
            &half_field(),
            &projection(),
            40,
            30,
            1.0,
            &SampleOptions::default(),
        );
        assert!(!sampled.is_defined(-1.0, 0.0));
        assert!(!sampled.is_defined(0.0, 30.0));
        assert!(!sampled.is_defined(f32::NAN, 2.0));
        assert!(sampled.is_defined(0.0, 0.0));
        assert!(sampled.is_defined(-0.4, 29.4));
    }

    #[test]
    fn test_mask_covers_each_block() {
        let options = SampleOptions {
            invert_v: true,
            mask: Some(MaskOptions::default()),
        };
        let sampled = SampledField::build(&half_field(), &projection(), 40, 30, 1.0, &options);
        let mask = sampled.mask().unwrap();
        assert_eq!(mask.pixel(2, 2), mask.pixel(3, 3));
        assert_eq!(mask.pixel(2, 2).a, 100);
        assert_eq!(mask.pixel(35, 10).a, 0);
    }

    #[test]
    fn test_randomize_prefers_defined_cells() {
        let sampled = SampledField::build(
            &half_field(),
            &projection(),
            40,
            30,
            1.0,
            &SampleOptions::default(),
        );
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let placement = sampled.randomize(&mut rng);
            assert!(placement.attempts <= RANDOMIZE_ATTEMPTS);
            assert!(placement.position.x >= 0.0 && placement.position.x < 40.0);
            assert!(placement.position.y >= 0.0 && placement.position.y < 30.0);
            if placement.defined {
                assert!(sampled.is_defined(placement.position.x, placement.position.y));
            }
        }
    }

    #[test]
    fn test_randomize_terminates_on_empty_field() {
        let sampled = SampledField::empty(64, 48);
        let mut rng = StdRng::seed_from_u64(1);
        let placement = sampled.randomize(&mut rng);
        assert_eq!(placement.attempts, RANDOMIZE_ATTEMPTS);
        assert!(!placement.defined);

        let zero = SampledField::empty(0, 0);
        assert_eq!(zero.randomize(&mut rng).attempts, 0);
    }

    #[test]
    fn test_odd_dimensions() {
        let sampled = SampledField::build(
            &half_field(),
            &projection(),
            5,
            3,
            1.0,
            &SampleOptions {
                invert_v: true,
                mask: Some(MaskOptions::default()),
            },
        );
        assert_eq!(sampled.grid_size(), (3, 2));
        assert!(sampled.is_defined(4.0, 2.0));
        assert_eq!(sampled.mask().unwrap().pixels().len(), 5 * 3 * 4);
    }
}
