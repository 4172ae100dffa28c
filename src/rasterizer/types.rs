//! Core types for the rasterizer

use std::rc::Rc;
use serde::{Serialize, Deserialize};
use super::math::{Point3, Vec2, Vec3};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const SKY: Color = Color { r: 166, g: 200, b: 255, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from floating point channels, rounding and clamping to 0-255
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        Self::new(channel(r), channel(g), channel(b))
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: channel(self.r as f32 * i),
            g: channel(self.g as f32 * i),
            b: channel(self.b as f32 * i),
            a: self.a,
        }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let mix = |a: u8, b: u8| channel(a as f32 + (b as f32 - a as f32) * t);
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn channel(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// A mesh vertex: position, texture coordinate, normal, color and the
/// light intensity written by the lighting stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl Vertex {
    pub fn new(pos: Point3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            pos,
            uv,
            normal,
            color: Color::WHITE,
            intensity: 0.0,
        }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z), Vec2::default(), Vec3::ZERO)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Interpolate every attribute between `self` (t = 0) and `other` (t = 1)
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            pos: self.pos.lerp(other.pos, t),
            uv: self.uv.lerp(other.uv, t),
            normal: self.normal + (other.normal - self.normal) * t,
            color: self.color.lerp(other.color, t),
            intensity: self.intensity + (other.intensity - self.intensity) * t,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::from_pos(0.0, 0.0, 0.0)
    }
}

/// Three vertices plus an optional texture. Winding decides which side
/// faces out, so it must be consistent across a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub texture: Option<Rc<Texture>>,
}

impl Triangle {
    pub fn new(vertices: [Vertex; 3]) -> Self {
        Self { vertices, texture: None }
    }

    pub fn with_texture(vertices: [Vertex; 3], texture: Rc<Texture>) -> Self {
        Self {
            vertices,
            texture: Some(texture),
        }
    }

    /// Copy of this triangle with every vertex replaced by `f(vertex)`
    pub fn map_vertices(&self, f: impl Fn(&Vertex) -> Vertex) -> Triangle {
        Triangle {
            vertices: [
                f(&self.vertices[0]),
                f(&self.vertices[1]),
                f(&self.vertices[2]),
            ],
            texture: self.texture.clone(),
        }
    }

    /// Normal used for lighting: points into the surface on the side that
    /// `cull_back_face` treats as visible, so light shining onto the visible
    /// side gives a positive dot product with the light's travel direction
    pub fn lighting_normal(&self) -> Vec3 {
        let [a, b, c] = &self.vertices;
        (c.pos - a.pos).cross(b.pos - a.pos)
    }

    /// Normal pointing out of the visible side
    pub fn outward_normal(&self) -> Vec3 {
        let [a, b, c] = &self.vertices;
        (b.pos - a.pos).cross(c.pos - b.pos)
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Load texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(img, name))
    }

    /// Load texture from raw encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: String) -> Result<Self, String> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| format!("Failed to decode image: {}", e))?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Nearest texel at UV coordinates, clamped to the texture edges.
    /// Row 0 is the first row of the image.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::WHITE;
        }
        let tx = texel_index(u, self.width);
        let ty = texel_index(v, self.height);
        self.pixels[ty * self.width + tx]
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Color::BLACK
        }
    }
}

fn texel_index(t: f32, size: usize) -> usize {
    let i = (t * size as f32).floor();
    if i.is_nan() || i < 0.0 {
        0
    } else {
        (i as usize).min(size - 1)
    }
}

/// A light source. Lights are immutable for the duration of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient { intensity: f32 },
    /// `direction` is the way the light travels
    Directional { direction: Vec3, intensity: f32 },
    Point { position: Point3, intensity: f32 },
}

/// Which normal the lighting stage uses per vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Face normal for all three vertices
    #[default]
    Face,
    /// Each vertex's own normal, face normal when it has none
    Smooth,
}

/// How triangles crossing the view volume are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipMode {
    /// Drop triangles with any vertex in front of the near plane and
    /// triangles whose projected bounds miss the screen
    #[default]
    Reject,
    /// Split triangles against the near plane
    Near,
    /// Split triangles against all six frustum planes
    Frustum,
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Vertical field of view in radians
    pub fov: f32,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance (only used by `ClipMode::Frustum`)
    pub far: f32,
    pub clip: ClipMode,
    pub shading: ShadingMode,
    /// Backface culling
    pub backface_cull: bool,
    /// Draw triangle outlines instead of filling
    pub wireframe: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_2,
            near: 0.1,
            far: 1000.0,
            clip: ClipMode::Reject,
            shading: ShadingMode::Face,
            backface_cull: true,
            wireframe: false,
        }
    }
}
