//! softraster: a software 3D rasterizer
//!
//! Transforms triangle meshes through model, view and projection space,
//! culls and clips them, and fills them into a pixel + depth buffer with
//! per-vertex lighting and affine texture mapping. No GPU involved.
//!
//! - [`rasterizer`]: the triangle pipeline and the framebuffer it draws into
//! - [`world`]: built-in meshes, OBJ loading and RON scene files

pub mod rasterizer;
pub mod world;
