//! Software triangle rasterizer
//!
//! Features:
//! - Model/view transforms with Euler rotations
//! - Per-vertex ambient, directional and point lighting (face or smooth normals)
//! - Back-face culling, near-plane or full frustum clipping
//! - Scanline fill with inverse-depth interpolation and a z-buffer
//! - Affine texture mapping (no perspective correction)

mod math;
mod types;
mod light;
mod clip;
mod framebuffer;
mod raster;
mod camera;
mod model;
mod render;

pub use math::*;
pub use types::*;
pub use light::*;
pub use clip::*;
pub use framebuffer::*;
pub use raster::*;
pub use camera::*;
pub use model::*;
pub use render::*;

/// Default framebuffer resolution
pub const WIDTH: usize = 320;
pub const HEIGHT: usize = 240;
