//! Semi-transparent colour wash showing wind speed under the particles

use crate::color::{ColorScale, Rgba};
use crate::render::{CanvasSurface, RenderError};
use serde::{Deserialize, Serialize};

/// Parameters of the mask wash
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskOptions {
    /// Speed mapped to the top of the colour scale
    pub max_speed: f32,
    /// Alpha byte of every coloured pixel
    pub alpha: u8,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            max_speed: 17.0,
            alpha: 100,
        }
    }
}

/// Full-resolution RGBA buffer for the mask surface
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMask {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ColorMask {
    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
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

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        if x >= self.width || y >= self.height {
            return Rgba::TRANSPARENT;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    /// Replace the contents of `canvas` with the mask.
    ///
    /// # Errors
    /// Fails with `RenderError::BufferSize` if the canvas dimensions differ.
    pub fn draw<C: CanvasSurface + ?Sized>(&self, canvas: &mut C) -> Result<(), RenderError> {
        canvas.put_image_data(&self.pixels)
    }
}

/// Colour of one mask cell
pub(crate) fn mask_color(
    scale: &ColorScale,
    magnitude: Option<f32>,
    options: &MaskOptions,
) -> Rgba {
    match magnitude {
        Some(m) => scale.color_for(m / options.max_speed, options.alpha),
        None => Rgba::TRANSPARENT,
    }
}
