//! Drawable surface capability
//!
//! The engine never talks to a concrete rendering API. Trails and the colour
//! mask are drawn through [`CanvasSurface`], which mirrors the handful of
//! 2D-context operations the animation needs: path stroking, rectangle
//! fills under a compositing mode, and raw pixel buffer access.
//! [`RasterCanvas`] is the in-memory RGBA implementation.

pub mod raster;

pub use raster::RasterCanvas;

use crate::color::Rgba;
use crate::core_types::Vec2;

/// How a fill combines with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Normal alpha blending
    #[default]
    SourceOver,
    /// Keep the destination only where the source is painted, scaling its
    /// alpha by the source alpha. Everything outside the source is cleared.
    DestinationIn,
    /// Replace the destination with the source
    Copy,
}

/// Minimal 2D drawing contract used by the simulator and the mask.
pub trait CanvasSurface {
    /// Width in device pixels
    fn width(&self) -> u32;

    /// Height in device pixels
    fn height(&self) -> u32;

    fn set_line_width(&mut self, width: f32);

    /// Discard the current path and start a new one
    fn begin_path(&mut self);

    fn move_to(&mut self, p: Vec2);

    fn line_to(&mut self, p: Vec2);

    /// Stroke the current path in `color` with source-over blending
    fn stroke(&mut self, color: Rgba) -> Result<(), RenderError>;

    /// Fill an axis-aligned rectangle
    fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
        mode: CompositeMode,
    ) -> Result<(), RenderError>;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    /// Copy of the RGBA8 pixel buffer, row-major
    fn get_image_data(&self) -> Vec<u8>;

    /// Overwrite the whole RGBA8 pixel buffer
    fn put_image_data(&mut self, data: &[u8]) -> Result<(), RenderError>;
}

/// Errors raised by a drawing backend
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Pixel buffer does not match `width * height * 4`
    BufferSize { expected: usize, actual: usize },
    /// A path point or rectangle had a NaN/infinite coordinate
    NonFiniteGeometry,
    /// Backend-specific failure
    Backend(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::BufferSize { expected, actual } => {
                write!(f, "Pixel buffer has {actual} bytes, expected {expected}")
            }
            RenderError::NonFiniteGeometry => write!(f, "Geometry contains non-finite coordinates"),
            RenderError::Backend(msg) => write!(f, "Canvas backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
