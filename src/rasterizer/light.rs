//! Per-vertex diffuse and ambient lighting

use super::math::Vec3;
use super::types::{Light, Triangle, Vertex};

/// Light `vertex` with `normal` against every light in `lights`.
///
/// Intensity is rebuilt from zero: ambient lights add their intensity,
/// point and directional lights add `intensity * cos(angle)` when the
/// surface faces them. The sum is clamped to [0, 1]. A zero-length normal
/// or light vector contributes nothing.
pub fn shade_vertex(vertex: &Vertex, normal: Vec3, lights: &[Light]) -> Vertex {
    let mut intensity = 0.0;

    for light in lights {
        intensity += match *light {
            Light::Ambient { intensity } => intensity,
            Light::Point { position, intensity } => {
                diffuse(vertex.pos - position, normal, intensity)
            }
            Light::Directional { direction, intensity } => {
                diffuse(direction, normal, intensity)
            }
        };
    }

    Vertex {
        intensity: clamp_intensity(intensity),
        ..*vertex
    }
}

fn diffuse(light_dir: Vec3, normal: Vec3, intensity: f32) -> f32 {
    let lengths = light_dir.len() * normal.len();
    if lengths == 0.0 || !lengths.is_finite() {
        return 0.0;
    }
    let d = intensity * light_dir.dot(normal) / lengths;
    if d > 0.0 { d } else { 0.0 }
}

fn clamp_intensity(i: f32) -> f32 {
    if i.is_nan() {
        0.0
    } else {
        i.clamp(0.0, 1.0)
    }
}

/// Light all three vertices with the triangle's face normal
pub fn apply_lighting(triangle: &Triangle, lights: &[Light]) -> Triangle {
    let normal = triangle.lighting_normal();
    triangle.map_vertices(|v| shade_vertex(v, normal, lights))
}

/// Light each vertex with its own normal. Vertex normals point out of the
/// surface, the lighting normal points in, hence the negation.
pub fn apply_smooth_lighting(triangle: &Triangle, lights: &[Light]) -> Triangle {
    let face = triangle.lighting_normal();
    triangle.map_vertices(|v| {
        let normal = if v.normal.is_zero() { face } else { -v.normal };
        shade_vertex(v, normal, lights)
    })
}
