//! Built-in meshes

use crate::rasterizer::{Mesh, Point3, Triangle, Vec2, Vec3, Vertex};

/// Cube centered on the origin with edge length `size`.
/// Two triangles per face, wound so each face is visible from outside.
pub fn cube_mesh(size: f32) -> Mesh {
    let h = size * 0.5;

    // (outward normal, corners counter-clockwise seen from outside)
    let faces: [(Vec3, [[f32; 3]; 4]); 6] = [
        (Vec3::new(0.0, 0.0, 1.0), [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
        (Vec3::new(0.0, 0.0, -1.0), [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
        (Vec3::new(0.0, 1.0, 0.0), [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
        (Vec3::new(0.0, -1.0, 0.0), [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
        (Vec3::new(1.0, 0.0, 0.0), [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]]),
        (Vec3::new(-1.0, 0.0, 0.0), [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]]),
    ];
    let uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    let mut triangles = Vec::with_capacity(12);
    for (normal, corners) in faces {
        let v: Vec<Vertex> = corners
            .iter()
            .zip(uvs)
            .map(|(c, uv)| Vertex::new(Point3::new(c[0] * h, c[1] * h, c[2] * h), uv, normal))
            .collect();
        triangles.push(Triangle::new([v[0], v[1], v[2]]));
        triangles.push(Triangle::new([v[0], v[2], v[3]]));
    }

    Mesh::new("cube", triangles)
}

/// Equilateral triangle with unit sides, centered on the origin in the
/// z = 0 plane and visible from -z
pub fn triangle_mesh() -> Mesh {
    let h = 3f32.sqrt() / 2.0;
    let normal = Vec3::new(0.0, 0.0, -1.0);
    let tri = Triangle::new([
        Vertex::new(Point3::new(0.0, 2.0 * h / 3.0, 0.0), Vec2::new(0.5, 1.0), normal),
        Vertex::new(Point3::new(0.5, -h / 3.0, 0.0), Vec2::new(1.0, 0.0), normal),
        Vertex::new(Point3::new(-0.5, -h / 3.0, 0.0), Vec2::new(0.0, 0.0), normal),
    ]);
    Mesh::new("triangle", vec![tri])
}
