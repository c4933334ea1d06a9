//! In-memory RGBA8 canvas
//!
//! Straight (non-premultiplied) alpha, row-major, four bytes per pixel.
//! Lines are rasterised by stepping along the segment and stamping a
//! square brush of the current line width; a pixel is blended at most once
//! per stroke, as a browser canvas would do.

use super::{CanvasSurface, CompositeMode, RenderError};
use crate::color::Rgba;
use crate::core_types::Vec2;
use rustc_hash::FxHashSet;

/// Software canvas backing tests and headless rendering
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    line_width: f32,
    /// Sub-paths of the path being built
    path: Vec<Vec<Vec2>>,
}

impl RasterCanvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            line_width: 1.0,
            path: Vec::new(),
        }
    }

    /// Borrow the RGBA8 buffer without copying
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Colour at (x, y); transparent outside the canvas
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        if x >= self.width || y >= self.height {
            return Rgba::TRANSPARENT;
        }
        let i = self.offset(x as usize, y as usize);
        Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    /// Number of pixels with non-zero alpha
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * 4
    }

    fn blend_over(&mut self, index: usize, color: Rgba) {
        let sa = color.alpha();
        if sa <= 0.0 {
            return;
        }
        let px = &mut self.pixels[index..index + 4];
        let da = f32::from(px[3]) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let src = [color.r, color.g, color.b];
        for c in 0..3 {
            let value = (f32::from(src[c]) * sa + f32::from(px[c]) * da * (1.0 - sa)) / out_a;
            px[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Pixel indices covered by the brush stamped at `p`
    fn stamp(&self, p: Vec2, covered: &mut FxHashSet<usize>) {
        let brush = self.line_width.round().max(1.0) as i64;
        let half = (brush - 1) / 2;
        let cx = p.x.floor() as i64;
        let cy = p.y.floor() as i64;
        for y in (cy - half)..(cy - half + brush) {
            for x in (cx - half)..(cx - half + brush) {
                if x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height) {
                    covered.insert(self.offset(x as usize, y as usize));
                }
            }
        }
    }

    fn rasterise_segment(&self, a: Vec2, b: Vec2, covered: &mut FxHashSet<usize>) {
        let delta = b - a;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(a + delta * t, covered);
        }
    }
}

impl CanvasSurface for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Vec2) {
        self.path.push(vec![p]);
    }

    fn line_to(&mut self, p: Vec2) {
        match self.path.last_mut() {
            Some(sub) => sub.push(p),
            // lineTo without a current point behaves like moveTo
            None => self.path.push(vec![p]),
        }
    }

    fn stroke(&mut self, color: Rgba) -> Result<(), RenderError> {
        if self
            .path
            .iter()
            .flatten()
            .any(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(RenderError::NonFiniteGeometry);
        }
        let mut covered = FxHashSet::default();
        for sub in &self.path {
            for pair in sub.windows(2) {
                self.rasterise_segment(pair[0], pair[1], &mut covered);
            }
        }
        for index in covered {
            self.blend_over(index, color);
        }
        Ok(())
    }

    fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
        mode: CompositeMode,
    ) -> Result<(), RenderError> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return Err(RenderError::NonFiniteGeometry);
        }
        let x0 = x.max(0.0).round() as u32;
        let y0 = y.max(0.0).round() as u32;
        let x1 = ((x + width).round().max(0.0) as u32).min(self.width);
        let y1 = ((y + height).round().max(0.0) as u32).min(self.height);
        let inside = |px: u32, py: u32| px >= x0 && px < x1 && py >= y0 && py < y1;

        match mode {
            CompositeMode::SourceOver => {
                for py in y0..y1 {
                    for px in x0..x1 {
                        let i = self.offset(px as usize, py as usize);
                        self.blend_over(i, color);
                    }
                }
            }
            CompositeMode::Copy => {
                for py in y0..y1 {
                    for px in x0..x1 {
                        let i = self.offset(px as usize, py as usize);
                        self.pixels[i..i + 4].copy_from_slice(&color.to_array());
                    }
                }
            }
            CompositeMode::DestinationIn => {
                let sa = u32::from(color.a);
                for py in 0..self.height {
                    for px in 0..self.width {
                        let i = self.offset(px as usize, py as usize) + 3;
                        // Integer floor so that faint trails decay all the way to zero
                        self.pixels[i] = if inside(px, py) {
                            (u32::from(self.pixels[i]) * sa / 255) as u8
                        } else {
                            0
                        };
                    }
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn get_image_data(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    fn put_image_data(&mut self, data: &[u8]) -> Result<(), RenderError> {
        if data.len() != self.pixels.len() {
            return Err(RenderError::BufferSize {
                expected: self.pixels.len(),
                actual: data.len(),
            });
        }
        self.pixels.copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_horizontal_line() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.begin_path();
        canvas.move_to(Vec2::new(1.0, 5.0));
        canvas.line_to(Vec2::new(6.0, 5.0));
        canvas.stroke(Rgba::grey(200)).unwrap();
        assert_eq!(canvas.painted_pixels(), 6);
        assert_eq!(canvas.pixel(3, 5), Rgba::grey(200));
        assert_eq!(canvas.pixel(3, 6), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_stroke_blends_each_pixel_once() {
        let mut canvas = RasterCanvas::new(8, 8);
        canvas.begin_path();
        canvas.move_to(Vec2::new(2.0, 2.0));
        canvas.line_to(Vec2::new(5.0, 2.0));
        canvas.move_to(Vec2::new(5.0, 2.0));
        canvas.line_to(Vec2::new(2.0, 2.0));
        canvas.stroke(Rgba::new(255, 0, 0, 128)).unwrap();
        assert_eq!(canvas.pixel(3, 2).a, 128);
    }

    #[test]
    fn test_destination_in_fades_alpha() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas
            .fill_rect(0.0, 0.0, 4.0, 4.0, Rgba::WHITE, CompositeMode::Copy)
            .unwrap();
        canvas
            .fill_rect(0.0, 0.0, 4.0, 4.0, Rgba::new(0, 0, 0, 128), CompositeMode::DestinationIn)
            .unwrap();
        let p = canvas.pixel(1, 1);
        assert_eq!((p.r, p.g, p.b), (255, 255, 255));
        assert_eq!(p.a, 128);

        // Repeated fading always reaches zero
        let fade = Rgba::new(0, 0, 0, 247);
        for _ in 0..400 {
            canvas
                .fill_rect(0.0, 0.0, 4.0, 4.0, fade, CompositeMode::DestinationIn)
                .unwrap();
        }
        assert_eq!(canvas.painted_pixels(), 0);
    }

    #[test]
    fn test_destination_in_clears_outside_rect() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas
            .fill_rect(0.0, 0.0, 4.0, 4.0, Rgba::WHITE, CompositeMode::Copy)
            .unwrap();
        canvas
            .fill_rect(0.0, 0.0, 2.0, 4.0, Rgba::WHITE, CompositeMode::DestinationIn)
            .unwrap();
        assert_eq!(canvas.painted_pixels(), 8);
    }

    #[test]
    fn test_non_finite_geometry_is_an_error() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.begin_path();
        canvas.move_to(Vec2::new(0.0, 0.0));
        canvas.line_to(Vec2::new(f32::NAN, 1.0));
        assert_eq!(canvas.stroke(Rgba::WHITE), Err(RenderError::NonFiniteGeometry));
    }

    #[test]
    fn test_image_data_round_trip_checks_size() {
        let mut canvas = RasterCanvas::new(2, 2);
        let data: Vec<u8> = (0..16).collect();
        canvas.put_image_data(&data).unwrap();
        assert_eq!(canvas.get_image_data(), data);
        assert_eq!(
            canvas.put_image_data(&data[..4]),
            Err(RenderError::BufferSize {
                expected: 16,
                actual: 4
            })
        );
    }
}
