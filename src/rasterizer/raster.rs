//! Scanline triangle fill and line drawing
//!
//! Triangles are split at the middle vertex into a flat-bottom and a
//! flat-top half. Each half walks its two edges one row at a time (DDA),
//! then each row walks from the left edge to the right edge one pixel at a
//! time. Pixels are sampled at their centers; a pixel belongs to a span when
//! its center lies in [left, right), so triangles sharing an edge never
//! draw the same pixel twice.
//!
//! Inverse depth is interpolated rather than depth, since 1/z is what
//! varies linearly in screen space. Texture coordinates are interpolated
//! linearly too (affine mapping).

use std::ops::{Add, AddAssign, Mul, Sub};
use super::framebuffer::PixelSink;
use super::math::Vec2;
use super::types::{Color, Texture};

/// A vertex in pixel space, ready for `fill_triangle`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    /// 1 / view-space depth
    pub inv_z: f32,
    pub intensity: f32,
    pub uv: Vec2,
    pub color: Color,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            inv_z: 1.0 / z,
            intensity: 1.0,
            uv: Vec2::default(),
            color: Color::WHITE,
        }
    }

    fn varying(&self) -> Varying {
        Varying {
            inv_z: self.inv_z,
            intensity: self.intensity,
            u: self.uv.x,
            v: self.uv.y,
            r: self.color.r as f32,
            g: self.color.g as f32,
            b: self.color.b as f32,
        }
    }
}

/// Everything that gets interpolated across the triangle
#[derive(Debug, Clone, Copy, Default)]
struct Varying {
    inv_z: f32,
    intensity: f32,
    u: f32,
    v: f32,
    r: f32,
    g: f32,
    b: f32,
}

impl Add for Varying {
    type Output = Varying;
    fn add(self, o: Varying) -> Varying {
        Varying {
            inv_z: self.inv_z + o.inv_z,
            intensity: self.intensity + o.intensity,
            u: self.u + o.u,
            v: self.v + o.v,
            r: self.r + o.r,
            g: self.g + o.g,
            b: self.b + o.b,
        }
    }
}

impl AddAssign for Varying {
    fn add_assign(&mut self, o: Varying) {
        *self = *self + o;
    }
}

impl Sub for Varying {
    type Output = Varying;
    fn sub(self, o: Varying) -> Varying {
        self + o * -1.0
    }
}

impl Mul<f32> for Varying {
    type Output = Varying;
    fn mul(self, s: f32) -> Varying {
        Varying {
            inv_z: self.inv_z * s,
            intensity: self.intensity * s,
            u: self.u * s,
            v: self.v * s,
            r: self.r * s,
            g: self.g * s,
            b: self.b * s,
        }
    }
}

/// One edge being walked down the screen
struct Edge {
    x: f32,
    x_step: f32,
    attr: Varying,
    attr_step: Varying,
}

impl Edge {
    /// Edge from `top` to `bottom`, positioned at the center of row `first_row`.
    /// Caller guarantees `bottom.y > top.y`.
    fn new(top: &ScreenVertex, bottom: &ScreenVertex, first_row: i32) -> Edge {
        let inv_dy = 1.0 / (bottom.y - top.y);
        let x_step = (bottom.x - top.x) * inv_dy;
        let attr_step = (bottom.varying() - top.varying()) * inv_dy;
        let prestep = first_row as f32 + 0.5 - top.y;

        Edge {
            x: top.x + x_step * prestep,
            x_step,
            attr: top.varying() + attr_step * prestep,
            attr_step,
        }
    }

    fn step(&mut self) {
        self.x += self.x_step;
        self.attr += self.attr_step;
    }
}

/// First pixel row/column whose center is at or after `t`
fn first_center(t: f32) -> i32 {
    (t - 0.5).ceil() as i32
}

/// Sort three vertices by ascending y
fn sort_by_y(v: [ScreenVertex; 3]) -> [ScreenVertex; 3] {
    let [mut a, mut b, mut c] = v;
    if b.y < a.y {
        std::mem::swap(&mut a, &mut b);
    }
    if c.y < a.y {
        std::mem::swap(&mut a, &mut c);
    }
    if c.y < b.y {
        std::mem::swap(&mut b, &mut c);
    }
    [a, b, c]
}

/// Fill a triangle with interpolated color, light, depth and texture.
///
/// Untextured triangles use the interpolated vertex color. Every pixel is
/// written through `PixelSink::write_pixel` with depth `1 / inv_z`, so the
/// sink's depth test decides visibility. Triangles with zero height or
/// non-finite coordinates draw nothing.
pub fn fill_triangle<S: PixelSink>(target: &mut S, vertices: [ScreenVertex; 3], texture: Option<&Texture>) {
    if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
        return;
    }

    let [a, b, c] = sort_by_y(vertices);
    if c.y - a.y <= 0.0 {
        return;
    }

    let rows = target.height() as i32;
    for (top, bottom) in [(&a, &b), (&b, &c)] {
        // flat half
        if bottom.y - top.y <= 0.0 {
            continue;
        }

        let y_start = first_center(top.y).max(0);
        let y_end = first_center(bottom.y).min(rows);
        if y_start >= y_end {
            continue;
        }

        let mut long = Edge::new(&a, &c, y_start);
        let mut short = Edge::new(top, bottom, y_start);

        for y in y_start..y_end {
            draw_span(target, y, &long, &short, texture);
            long.step();
            short.step();
        }
    }
}

fn draw_span<S: PixelSink>(target: &mut S, y: i32, e1: &Edge, e2: &Edge, texture: Option<&Texture>) {
    let (left, right) = if e1.x <= e2.x { (e1, e2) } else { (e2, e1) };

    let dx = right.x - left.x;
    if dx <= 0.0 {
        return;
    }

    let x_start = first_center(left.x).max(0);
    let x_end = first_center(right.x).min(target.width() as i32);
    if x_start >= x_end {
        return;
    }

    let step = (right.attr - left.attr) * (1.0 / dx);
    let mut attr = left.attr + step * (x_start as f32 + 0.5 - left.x);

    for x in x_start..x_end {
        if attr.inv_z > 0.0 {
            let base = match texture {
                Some(tex) => tex.sample(attr.u, 1.0 - attr.v),
                None => Color::from_f32(attr.r, attr.g, attr.b),
            };
            target.write_pixel(x, y, 1.0 / attr.inv_z, base.shade(attr.intensity));
        }
        attr += step;
    }
}

/// Draw a line with DDA, blending from `start_color` to `end_color`.
/// Both endpoints are drawn; no depth test. The line is clipped to the
/// target first, so only on-screen pixels are stepped over.
pub fn draw_line<S: PixelSink>(
    target: &mut S,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    start_color: Color,
    end_color: Color,
) {
    if (x0, y0) == (x1, y1) {
        target.set_pixel(x0, y0, start_color);
        return;
    }

    // f64 keeps full i32 endpoints exact
    let (ox, oy) = (x0 as f64, y0 as f64);
    let (dx, dy) = (x1 as f64 - ox, y1 as f64 - oy);
    let max_x = target.width() as f64 - 1.0;
    let max_y = target.height() as f64 - 1.0;
    let Some((t0, t1)) = clip_line(ox, oy, dx, dy, max_x, max_y) else {
        return;
    };

    let steps = ((t1 - t0) * dx.abs().max(dy.abs())).round() as i32;
    for i in 0..=steps {
        let t = if steps == 0 {
            t0
        } else {
            t0 + (t1 - t0) * i as f64 / steps as f64
        };
        let x = (ox + dx * t).round() as i32;
        let y = (oy + dy * t).round() as i32;
        target.set_pixel(x, y, start_color.lerp(end_color, t as f32));
    }
}

/// Liang-Barsky: the part of `origin + t * delta`, t in [0, 1], inside
/// [0, max_x] x [0, max_y]
fn clip_line(x: f64, y: f64, dx: f64, dy: f64, max_x: f64, max_y: f64) -> Option<(f64, f64)> {
    if max_x < 0.0 || max_y < 0.0 {
        return None;
    }

    let (mut t0, mut t1) = (0.0, 1.0);
    for (p, q) in [(-dx, x), (dx, max_x - x), (-dy, y), (dy, max_y - y)] {
        if p == 0.0 {
            // parallel to this edge and outside it
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = f64::max(t0, r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = f64::min(t1, r);
        }
    }
    Some((t0, t1))
}

/// Outline of a triangle, each edge blending between its vertex colors
pub fn draw_wireframe_triangle<S: PixelSink>(target: &mut S, vertices: [(i32, i32); 3], colors: [Color; 3]) {
    for (i, j) in [(0, 1), (1, 2), (2, 0)] {
        draw_line(target, vertices[i], vertices[j], colors[i], colors[j]);
    }
}
