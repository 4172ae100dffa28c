//! Triangle clipping against planes in view space
//!
//! A plane is given by a point on it and a normal pointing to the outside.
//! A vertex is inside when `dot(plane_point - vertex, normalize(normal)) >= 0`.

use super::math::{Point3, Vec3};
use super::types::{Triangle, Vertex};

/// A clipping plane (point on the plane, outward normal)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3,
    pub normal: Vec3,
}

impl Plane {
    pub const fn new(point: Point3, normal: Vec3) -> Self {
        Self { point, normal }
    }

    /// Signed distance, non-negative when `p` is inside.
    /// `None` for a zero normal.
    pub fn distance(&self, p: Point3) -> Option<f32> {
        let n = self.normal.try_normalize()?;
        Some((self.point - p).dot(n))
    }
}

/// Signed distance from `point` to a plane; non-negative means inside
pub fn distance_to_plane(plane_point: Point3, plane_normal: Vec3, point: Point3) -> Option<f32> {
    Plane::new(plane_point, plane_normal).distance(point)
}

/// Parameter `k` where `line_start + k * line_dir` meets the plane.
/// `None` when the line runs parallel to the plane.
pub fn line_plane_intersection(
    plane_point: Point3,
    plane_normal: Vec3,
    line_start: Point3,
    line_dir: Vec3,
) -> Option<f32> {
    let n = plane_normal.try_normalize()?;
    let denom = line_dir.dot(n);
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let k = (plane_point.to_vec().dot(n) - line_start.to_vec().dot(n)) / denom;
    k.is_finite().then_some(k)
}

/// Result of clipping one triangle against one plane
#[derive(Debug, Clone, PartialEq)]
pub enum Clipped {
    /// Nothing left inside
    Culled,
    One(Triangle),
    Two(Triangle, Triangle),
}

impl Clipped {
    pub fn count(&self) -> usize {
        match self {
            Clipped::Culled => 0,
            Clipped::One(_) => 1,
            Clipped::Two(_, _) => 2,
        }
    }

    pub fn into_vec(self) -> Vec<Triangle> {
        match self {
            Clipped::Culled => Vec::new(),
            Clipped::One(a) => vec![a],
            Clipped::Two(a, b) => vec![a, b],
        }
    }
}

/// Vertex where the edge `inside -> outside` crosses `plane`, with every
/// attribute interpolated along the edge
fn edge_crossing(plane: &Plane, inside: &Vertex, outside: &Vertex) -> Option<Vertex> {
    let k = line_plane_intersection(plane.point, plane.normal, inside.pos, outside.pos - inside.pos)?;
    Some(inside.lerp(outside, k.clamp(0.0, 1.0)))
}

/// Clip `triangle` against `plane`.
///
/// All inside: returned unchanged. One inside: the two outside vertices
/// move onto the plane. Two inside: the quad left over is split in two.
/// None inside, or an edge that can't be intersected: `Culled`.
/// Output triangles keep the input's winding.
pub fn clip_against_plane(triangle: &Triangle, plane: &Plane) -> Clipped {
    let mut inside = [0usize; 3];
    let mut outside = [0usize; 3];
    let (mut n_in, mut n_out) = (0, 0);

    for (i, v) in triangle.vertices.iter().enumerate() {
        let Some(d) = plane.distance(v.pos) else {
            return Clipped::Culled;
        };
        if d >= 0.0 {
            inside[n_in] = i;
            n_in += 1;
        } else {
            outside[n_out] = i;
            n_out += 1;
        }
    }

    let verts = &triangle.vertices;
    match n_in {
        3 => Clipped::One(triangle.clone()),
        1 => {
            let a = &verts[inside[0]];
            let (Some(p), Some(q)) = (
                edge_crossing(plane, a, &verts[outside[0]]),
                edge_crossing(plane, a, &verts[outside[1]]),
            ) else {
                return Clipped::Culled;
            };
            let mut out = triangle.clone();
            out.vertices[outside[0]] = p;
            out.vertices[outside[1]] = q;
            Clipped::One(out)
        }
        2 => {
            // a -> b -> o follows the input winding
            let o = outside[0];
            let (a, b) = ((o + 1) % 3, (o + 2) % 3);
            let (Some(p), Some(q)) = (
                edge_crossing(plane, &verts[a], &verts[o]),
                edge_crossing(plane, &verts[b], &verts[o]),
            ) else {
                return Clipped::Culled;
            };
            // quad a, b, q, p split along a-q
            let mut first = triangle.clone();
            first.vertices[o] = q;
            let mut second = triangle.clone();
            second.vertices[o] = p;
            second.vertices[b] = q;
            Clipped::Two(first, second)
        }
        _ => Clipped::Culled,
    }
}

/// Clip against every plane in turn. Each pass only sees the pieces the
/// previous pass kept, so no piece is emitted twice.
pub fn clip_against_planes(triangle: &Triangle, planes: &[Plane]) -> Vec<Triangle> {
    let mut pieces = vec![triangle.clone()];
    for plane in planes {
        let mut next = Vec::with_capacity(pieces.len() * 2);
        for piece in &pieces {
            next.extend(clip_against_plane(piece, plane).into_vec());
        }
        if next.is_empty() {
            return next;
        }
        pieces = next;
    }
    pieces
}

/// Plane at view depth `near`, keeping everything beyond it
pub fn near_plane(near: f32) -> Plane {
    Plane::new(Point3::new(0.0, 0.0, near), Vec3::new(0.0, 0.0, -1.0))
}

/// Plane at view depth `far`, keeping everything before it
pub fn far_plane(far: f32) -> Plane {
    Plane::new(Point3::new(0.0, 0.0, far), Vec3::new(0.0, 0.0, 1.0))
}

/// The six view-space frustum planes for the projection used by the
/// pipeline: visible points satisfy |x| <= z * tan_half_fov and
/// |y| * aspect_ratio <= z * tan_half_fov
pub fn frustum_planes(tan_half_fov: f32, aspect_ratio: f32, near: f32, far: f32) -> [Plane; 6] {
    let t = tan_half_fov;
    [
        near_plane(near),
        far_plane(far),
        Plane::new(Point3::ORIGIN, Vec3::new(-1.0, 0.0, -t)),
        Plane::new(Point3::ORIGIN, Vec3::new(1.0, 0.0, -t)),
        Plane::new(Point3::ORIGIN, Vec3::new(0.0, aspect_ratio, -t)),
        Plane::new(Point3::ORIGIN, Vec3::new(0.0, -aspect_ratio, -t)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Vec2;

    fn tri(a: (f32, f32, f32), b: (f32, f32, f32), c: (f32, f32, f32)) -> Triangle {
        Triangle::new([
            Vertex::from_pos(a.0, a.1, a.2),
            Vertex::from_pos(b.0, b.1, b.2),
            Vertex::from_pos(c.0, c.1, c.2),
        ])
    }

    /// Area of the triangle projected on the xz plane
    fn area_xz(t: &Triangle) -> f32 {
        let [a, b, c] = &t.vertices;
        let u = b.pos - a.pos;
        let v = c.pos - a.pos;
        0.5 * (u.x * v.z - u.z * v.x)
    }

    #[test]
    fn test_distance_sign_convention() {
        let p = near_plane(1.0);
        assert!((p.distance(Point3::new(0.0, 0.0, 3.0)).unwrap() - 2.0).abs() < 1e-6);
        assert!(p.distance(Point3::new(0.0, 0.0, 0.5)).unwrap() < 0.0);
        assert_eq!(p.distance(Point3::new(5.0, 5.0, 1.0)), Some(0.0));
        assert_eq!(distance_to_plane(Point3::ORIGIN, Vec3::ZERO, Point3::ORIGIN), None);
    }

    #[test]
    fn test_line_plane_intersection() {
        let k = line_plane_intersection(
            Point3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        );
        assert_eq!(k, Some(0.25));

        let parallel = line_plane_intersection(
            Point3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(parallel, None);
    }

    #[test]
    fn test_all_inside_is_unchanged() {
        let t = tri((0.0, 1.0, 5.0), (1.0, -1.0, 5.0), (-1.0, -1.0, 6.0));
        assert_eq!(clip_against_plane(&t, &near_plane(1.0)), Clipped::One(t));
    }

    #[test]
    fn test_all_outside_is_culled() {
        let t = tri((0.0, 1.0, 0.5), (1.0, -1.0, 0.2), (-1.0, -1.0, -3.0));
        let c = clip_against_plane(&t, &near_plane(1.0));
        assert_eq!(c.count(), 0);
        assert_eq!(c, Clipped::Culled);
    }

    #[test]
    fn test_one_inside_moves_two_vertices_to_plane() {
        let mut t = tri((0.0, 0.0, 3.0), (1.0, 0.0, 0.0), (-1.0, 0.0, 0.0));
        t.vertices[0].uv = Vec2::new(1.0, 1.0);
        let plane = near_plane(1.0);
        let Clipped::One(out) = clip_against_plane(&t, &plane) else {
            panic!("expected one triangle");
        };
        assert_eq!(out.vertices[0], t.vertices[0]);
        for i in [1, 2] {
            assert!((out.vertices[i].pos.z - 1.0).abs() < 1e-6);
            // two thirds of the way from the inside vertex to the outside one
            assert!((out.vertices[i].uv.x - 1.0 / 3.0).abs() < 1e-5);
        }
        assert!((out.vertices[1].pos.x - 2.0 / 3.0).abs() < 1e-5);
        assert!((out.vertices[2].pos.x + 2.0 / 3.0).abs() < 1e-5);
        // winding preserved
        assert!(area_xz(&out).signum() == area_xz(&t).signum());
    }

    #[test]
    fn test_two_inside_splits_in_two_covering_inside_area() {
        let t = tri((-1.0, 0.0, 3.0), (1.0, 0.0, 3.0), (0.0, 0.0, -1.0));
        let plane = near_plane(1.0);
        let Clipped::Two(a, b) = clip_against_plane(&t, &plane) else {
            panic!("expected two triangles");
        };
        for piece in [&a, &b] {
            for v in &piece.vertices {
                assert!(plane.distance(v.pos).unwrap() >= -1e-5);
            }
            assert!(area_xz(piece).signum() == area_xz(&t).signum());
        }
        // inside part is a trapezoid: z from 1 to 3, width 1 at z=1, 2 at z=3
        let expected = 0.5 * (1.0 + 2.0) * 2.0;
        let got = area_xz(&a).abs() + area_xz(&b).abs();
        assert!((got - expected).abs() < 1e-4, "area {}", got);
    }

    #[test]
    fn test_parallel_edge_is_culled_not_nan() {
        let t = tri((0.0, 0.0, 2.0), (1.0, 0.0, 0.0), (-1.0, 0.0, 0.0));
        let zero = Plane::new(Point3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        assert_eq!(clip_against_plane(&t, &zero), Clipped::Culled);
    }

    #[test]
    fn test_frustum_keeps_visible_and_drops_offscreen() {
        let planes = frustum_planes(1.0, 1.0, 0.1, 100.0);
        let visible = tri((0.0, 1.0, 5.0), (1.0, -1.0, 5.0), (-1.0, -1.0, 5.0));
        assert_eq!(clip_against_planes(&visible, &planes), vec![visible.clone()]);

        let left = tri((-20.0, 1.0, 5.0), (-19.0, -1.0, 5.0), (-21.0, -1.0, 5.0));
        assert!(clip_against_planes(&left, &planes).is_empty());

        let far = tri((0.0, 1.0, 500.0), (1.0, -1.0, 500.0), (-1.0, -1.0, 500.0));
        assert!(clip_against_planes(&far, &planes).is_empty());
    }

    #[test]
    fn test_frustum_pieces_stay_inside() {
        let planes = frustum_planes(1.0, 1.0, 0.1, 100.0);
        // straddles the right and near planes
        let t = tri((0.0, 0.0, -1.0), (12.0, 0.5, 6.0), (0.0, 3.0, 6.0));
        let pieces = clip_against_planes(&t, &planes);
        assert!(!pieces.is_empty());
        for piece in &pieces {
            for v in &piece.vertices {
                for plane in &planes {
                    assert!(plane.distance(v.pos).unwrap() >= -1e-3);
                }
            }
        }
    }
}
