//! Pixel + depth buffer and the pixel-write contract the rasterizer draws through

use super::types::{Color, Texture};

/// Depth of a pixel nothing has been drawn to yet
pub const FAR_DEPTH: f32 = f32::MAX;

/// Anything the rasterizer can draw into.
///
/// Implementations do their own bounds check and depth comparison:
/// writes outside the surface or behind what is already there are dropped.
pub trait PixelSink {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn aspect_ratio(&self) -> f32 {
        if self.height() == 0 {
            1.0
        } else {
            self.width() as f32 / self.height() as f32
        }
    }

    /// Write `color` at (x, y) if `depth` is strictly closer than the stored depth
    fn write_pixel(&mut self, x: i32, y: i32, depth: f32, color: Color);

    /// Write `color` at (x, y) ignoring depth
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);
}

/// Framebuffer for software rendering.
///
/// Row 0 is the bottom of the image (pixel y grows with NDC y);
/// `to_rgba_top_down` flips it for presentation.
pub struct Framebuffer {
    pub pixels: Vec<u8>,    // RGBA, 4 bytes per pixel
    pub zbuffer: Vec<f32>,  // Depth buffer
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            zbuffer: vec![FAR_DEPTH; width * height],
            width,
            height,
        }
    }

    /// Fill with `color` and reset every depth to `FAR_DEPTH`
    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        self.zbuffer.fill(FAR_DEPTH);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    fn put(&mut self, idx: usize, color: Color) {
        let p = idx * 4;
        self.pixels[p..p + 4].copy_from_slice(&color.to_bytes());
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = (y * self.width + x) * 4;
        let b = &self.pixels[p..p + 4];
        Some(Color::with_alpha(b[0], b[1], b[2], b[3]))
    }

    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.zbuffer[y * self.width + x])
    }

    /// Fill the half-open rectangle [left, right) x [top, bottom), no depth
    pub fn draw_rectangle(&mut self, left: i32, top: i32, right: i32, bottom: i32, color: Color) {
        for y in top.max(0)..bottom.min(self.height as i32) {
            for x in left.max(0)..right.min(self.width as i32) {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Blit `texture` with its first row at `y`, no depth
    pub fn draw_texture(&mut self, texture: &Texture, x: i32, y: i32) {
        for ty in 0..texture.height {
            for tx in 0..texture.width {
                self.set_pixel(x + tx as i32, y + ty as i32, texture.get_pixel(tx, ty));
            }
        }
    }

    /// RGBA bytes with the top row first, for uploading to a display texture
    pub fn to_rgba_top_down(&self) -> Vec<u8> {
        let row = self.width * 4;
        let mut out = Vec::with_capacity(self.pixels.len());
        for y in (0..self.height).rev() {
            out.extend_from_slice(&self.pixels[y * row..(y + 1) * row]);
        }
        out
    }
}

impl PixelSink for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn write_pixel(&mut self, x: i32, y: i32, depth: f32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            if depth < self.zbuffer[idx] {
                self.zbuffer[idx] = depth;
                self.put(idx, color);
            }
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.put(idx, color);
        }
    }
}
