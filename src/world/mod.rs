//! World module - meshes, models and scenes
//!
//! - Built-in cube and triangle meshes
//! - Wavefront OBJ loading
//! - RON scene files tying meshes, models, camera and lights together

mod meshes;
mod obj;
mod scene;

pub use meshes::*;
pub use obj::*;
pub use scene::*;
