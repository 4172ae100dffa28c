//! Triangle pipeline
//!
//! Per triangle: world transform, lighting (world space), view transform,
//! back-face cull, clip, projection to NDC, conversion to pixel space,
//! scanline fill. Every stage returns a new triangle; mesh triangles are
//! never modified.

use std::fmt;
use std::ops::AddAssign;
use super::camera::Camera;
use super::clip::{clip_against_plane, clip_against_planes, frustum_planes, near_plane};
use super::framebuffer::PixelSink;
use super::light::{apply_lighting, apply_smooth_lighting};
use super::math::{ndc_to_pixel, project, Mat4};
use super::model::Model;
use super::raster::{draw_wireframe_triangle, fill_triangle, ScreenVertex};
use super::types::{ClipMode, Light, RasterSettings, ShadingMode, Triangle, Vertex};

/// Per-model triangle counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Triangles in the mesh
    pub submitted: usize,
    /// Dropped as back faces or degenerate
    pub culled: usize,
    /// Dropped entirely by near/frustum handling
    pub clipped: usize,
    /// Triangles handed to the rasterizer (clipping can split one into several)
    pub drawn: usize,
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, o: RenderStats) {
        self.submitted += o.submitted;
        self.culled += o.culled;
        self.clipped += o.clipped;
        self.drawn += o.drawn;
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} submitted, {} culled, {} clipped, {} drawn",
            self.submitted, self.culled, self.clipped, self.drawn
        )
    }
}

/// Render state for one frame: settings plus values derived from them.
/// The target, camera and lights are passed to each call.
#[derive(Debug, Clone)]
pub struct FrameContext {
    settings: RasterSettings,
    tan_half_fov: f32,
}

impl FrameContext {
    pub fn new(settings: RasterSettings) -> Self {
        let tan_half_fov = (settings.fov * 0.5).tan();
        Self { settings, tan_half_fov }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    /// Render every triangle of `model` into `target`
    pub fn render_model<S: PixelSink>(
        &self,
        target: &mut S,
        model: &Model,
        camera: &Camera,
        lights: &[Light],
    ) -> RenderStats {
        let world = model.world_matrix();
        let normals = model.normal_matrix();
        let view = camera.view_matrix();

        let mut stats = RenderStats::default();
        for triangle in &model.mesh.triangles {
            stats.submitted += 1;
            self.render_triangle(target, triangle, &world, &normals, &view, lights, &mut stats);
        }

        log::debug!("model '{}': {}", model.mesh.name, stats);
        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn render_triangle<S: PixelSink>(
        &self,
        target: &mut S,
        source: &Triangle,
        world: &Mat4,
        normals: &Mat4,
        view: &Mat4,
        lights: &[Light],
        stats: &mut RenderStats,
    ) {
        let in_world = transform_triangle(source, world, normals);
        if in_world.lighting_normal().try_normalize().is_none() {
            log::trace!("skipping degenerate triangle {:?}", source.vertices.map(|v| v.pos));
            stats.culled += 1;
            return;
        }

        let lit = match self.settings.shading {
            ShadingMode::Face => apply_lighting(&in_world, lights),
            ShadingMode::Smooth => apply_smooth_lighting(&in_world, lights),
        };

        // view matrix is rigid, so it moves normals too
        let in_view = transform_triangle(&lit, view, view);
        if self.settings.backface_cull && cull_back_face(&in_view) {
            stats.culled += 1;
            return;
        }

        let pieces = match self.settings.clip {
            ClipMode::Reject => {
                if in_view.vertices.iter().any(|v| v.pos.z <= self.settings.near) {
                    Vec::new()
                } else {
                    vec![in_view]
                }
            }
            ClipMode::Near => clip_against_plane(&in_view, &near_plane(self.settings.near)).into_vec(),
            ClipMode::Frustum => {
                let planes = frustum_planes(
                    self.tan_half_fov,
                    target.aspect_ratio(),
                    self.settings.near,
                    self.settings.far,
                );
                clip_against_planes(&in_view, &planes)
            }
        };

        let mut drawn = 0;
        for piece in &pieces {
            let ndc = project_triangle(piece, target.aspect_ratio(), self.tan_half_fov);
            if outside_ndc_bounds(&ndc) {
                continue;
            }
            let screen = convert_triangle_to_pixel_space(&ndc, target.width(), target.height());
            self.rasterize(target, &screen);
            drawn += 1;
        }

        if drawn == 0 {
            stats.clipped += 1;
        }
        stats.drawn += drawn;
    }

    fn rasterize<S: PixelSink>(&self, target: &mut S, triangle: &Triangle) {
        if self.settings.wireframe {
            let corners = triangle.vertices.map(|v| (v.pos.x.round() as i32, v.pos.y.round() as i32));
            let colors = triangle.vertices.map(|v| v.color.shade(v.intensity));
            draw_wireframe_triangle(target, corners, colors);
        } else {
            fill_triangle(target, triangle.vertices.map(screen_vertex), triangle.texture.as_deref());
        }
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new(RasterSettings::default())
    }
}

fn screen_vertex(v: Vertex) -> ScreenVertex {
    ScreenVertex {
        x: v.pos.x,
        y: v.pos.y,
        inv_z: 1.0 / v.pos.z,
        intensity: v.intensity,
        uv: v.uv,
        color: v.color,
    }
}

/// Move positions by `points` and normals by `normals`
pub fn transform_triangle(triangle: &Triangle, points: &Mat4, normals: &Mat4) -> Triangle {
    triangle.map_vertices(|v| Vertex {
        pos: points.transform_point(v.pos),
        normal: normals.transform_vector(v.normal),
        ..*v
    })
}

/// True when a view-space triangle faces away from the camera at the
/// origin. Degenerate triangles count as facing away.
pub fn cull_back_face(triangle: &Triangle) -> bool {
    let normal = triangle.outward_normal();
    normal.dot(triangle.vertices[0].pos.to_vec()) >= 0.0
}

/// View space to NDC. z stays the view-space depth.
pub fn project_triangle(triangle: &Triangle, aspect_ratio: f32, tan_half_fov: f32) -> Triangle {
    triangle.map_vertices(|v| Vertex {
        pos: project(v.pos, aspect_ratio, tan_half_fov),
        ..*v
    })
}

/// NDC to pixel coordinates for a `width` x `height` target
pub fn convert_triangle_to_pixel_space(triangle: &Triangle, width: usize, height: usize) -> Triangle {
    triangle.map_vertices(|v| Vertex {
        pos: ndc_to_pixel(v.pos, width, height),
        ..*v
    })
}

/// True when the triangle's NDC bounding box misses [-1, 1] on x or y
pub fn outside_ndc_bounds(triangle: &Triangle) -> bool {
    let v = &triangle.vertices;
    v.iter().all(|v| v.pos.x < -1.0)
        || v.iter().all(|v| v.pos.x > 1.0)
        || v.iter().all(|v| v.pos.y < -1.0)
        || v.iter().all(|v| v.pos.y > 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use crate::rasterizer::framebuffer::{Framebuffer, FAR_DEPTH};
    use crate::rasterizer::math::{pixel_to_ndc, Point3, Vec3};
    use crate::rasterizer::model::Mesh;
    use crate::rasterizer::types::Color;

    fn equilateral(z: f32, side: f32, color: Color) -> Triangle {
        let h = side * 3f32.sqrt() / 2.0;
        Triangle::new([
            Vertex::from_pos(0.0, 2.0 * h / 3.0, z).with_color(color),
            Vertex::from_pos(side / 2.0, -h / 3.0, z).with_color(color),
            Vertex::from_pos(-side / 2.0, -h / 3.0, z).with_color(color),
        ])
    }

    fn reversed(t: &Triangle) -> Triangle {
        let [a, b, c] = t.vertices;
        Triangle::new([a, c, b])
    }

    fn model_of(triangles: Vec<Triangle>) -> Model {
        Model::new(Rc::new(Mesh::new("test", triangles)))
    }

    fn written(fb: &Framebuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..fb.height {
            for x in 0..fb.width {
                if fb.depth(x, y) != Some(FAR_DEPTH) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    const AMBIENT: [Light; 1] = [Light::Ambient { intensity: 0.4 }];

    #[test]
    fn test_unit_triangle_ambient_scenario() {
        let mut fb = Framebuffer::new(100, 100);
        let ctx = FrameContext::default();
        let model = model_of(vec![equilateral(5.0, 1.0, Color::WHITE)]);

        let stats = ctx.render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats, RenderStats { submitted: 1, culled: 0, clipped: 0, drawn: 1 });

        let grey = Color::new(102, 102, 102);
        assert_eq!(fb.pixel(50, 50), Some(grey));

        let px = written(&fb);
        assert!(!px.is_empty());
        for &(x, y) in &px {
            assert_eq!(fb.pixel(x, y), Some(grey));
            let d = fb.depth(x, y).unwrap_or(FAR_DEPTH);
            assert!((d - 5.0).abs() < 1e-3, "depth {} at ({}, {})", d, x, y);
        }

        // centered on the screen
        let n = px.len() as f32;
        let cx = px.iter().map(|&(x, _)| x as f32 + 0.5).sum::<f32>() / n;
        let cy = px.iter().map(|&(_, y)| y as f32 + 0.5).sum::<f32>() / n;
        assert!((cx - 50.0).abs() < 1.0, "cx = {}", cx);
        assert!((cy - 50.0).abs() < 1.0, "cy = {}", cy);

        // untouched outside
        assert_eq!(fb.depth(0, 0), Some(FAR_DEPTH));
        assert_eq!(fb.depth(50, 10), Some(FAR_DEPTH));
    }

    #[test]
    fn test_overlap_is_order_independent() {
        let near = equilateral(3.0, 1.0, Color::RED);
        // twice as big at twice the distance: same screen footprint
        let far = equilateral(6.0, 2.0, Color::BLUE);
        let lights = [Light::Ambient { intensity: 1.0 }];
        let ctx = FrameContext::default();

        for order in [vec![near.clone(), far.clone()], vec![far.clone(), near.clone()]] {
            let mut fb = Framebuffer::new(100, 100);
            ctx.render_model(&mut fb, &model_of(order), &Camera::default(), &lights);
            assert_eq!(fb.pixel(50, 50), Some(Color::RED));
            assert!((fb.depth(50, 50).unwrap_or(FAR_DEPTH) - 3.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_cull_flips_with_winding() {
        let t = Triangle::new([
            Vertex::from_pos(0.0, 1.0, 5.0),
            Vertex::from_pos(1.0, -1.0, 5.0),
            Vertex::from_pos(-1.0, -1.0, 5.0),
        ]);
        assert!(!cull_back_face(&t));
        assert!(cull_back_face(&reversed(&t)));

        let flat = Triangle::new([Vertex::from_pos(0.0, 0.0, 5.0); 3]);
        assert!(cull_back_face(&flat));
    }

    #[test]
    fn test_back_faces_skipped_unless_disabled() {
        let model = model_of(vec![reversed(&equilateral(5.0, 1.0, Color::WHITE))]);

        let mut fb = Framebuffer::new(100, 100);
        let stats = FrameContext::default().render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats.culled, 1);
        assert!(written(&fb).is_empty());

        let settings = RasterSettings { backface_cull: false, ..Default::default() };
        let stats = FrameContext::new(settings).render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats.drawn, 1);
        assert!(!written(&fb).is_empty());
    }

    // Visible triangle with one vertex behind the camera
    fn straddling_near_plane() -> Triangle {
        Triangle::new([
            Vertex::from_pos(0.0, 1.0, 2.0),
            Vertex::from_pos(1.0, -1.0, 2.0),
            Vertex::from_pos(-1.0, -1.0, -1.0),
        ])
    }

    #[test]
    fn test_near_reject_versus_near_clip() {
        let model = model_of(vec![straddling_near_plane()]);
        let lights = [Light::Ambient { intensity: 1.0 }];

        let mut fb = Framebuffer::new(64, 64);
        let stats = FrameContext::default().render_model(&mut fb, &model, &Camera::default(), &lights);
        assert_eq!(stats.clipped, 1);
        assert!(written(&fb).is_empty());

        let settings = RasterSettings { clip: ClipMode::Near, ..Default::default() };
        let stats = FrameContext::new(settings).render_model(&mut fb, &model, &Camera::default(), &lights);
        assert_eq!(stats.clipped, 0);
        assert!(stats.drawn >= 1);
        let px = written(&fb);
        assert!(!px.is_empty());
        for (x, y) in px {
            let d = fb.depth(x, y).unwrap_or(FAR_DEPTH);
            assert!(d >= 0.1 - 1e-4 && d.is_finite(), "depth {}", d);
        }
    }

    #[test]
    fn test_frustum_mode_drops_beyond_far() {
        let model = model_of(vec![equilateral(20.0, 4.0, Color::WHITE)]);
        let base = RasterSettings { far: 10.0, ..Default::default() };

        let mut fb = Framebuffer::new(32, 32);
        let stats = FrameContext::new(base.clone()).render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats.drawn, 1);

        let settings = RasterSettings { clip: ClipMode::Frustum, ..base };
        let mut fb = Framebuffer::new(32, 32);
        let stats = FrameContext::new(settings).render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats.clipped, 1);
        assert!(written(&fb).is_empty());
    }

    #[test]
    fn test_frustum_mode_clips_to_screen() {
        // spills far past the right edge
        let t = Triangle::new([
            Vertex::from_pos(0.0, 1.0, 2.0),
            Vertex::from_pos(20.0, -1.0, 2.0),
            Vertex::from_pos(-1.0, -1.0, 2.0),
        ]);
        let settings = RasterSettings { clip: ClipMode::Frustum, ..Default::default() };
        let mut fb = Framebuffer::new(40, 40);
        let stats = FrameContext::new(settings).render_model(&mut fb, &model_of(vec![t]), &Camera::default(), &AMBIENT);
        assert!(stats.drawn >= 2);
        assert!(fb.depth(39, 20) != Some(FAR_DEPTH));
    }

    #[test]
    fn test_offscreen_triangle_rejected() {
        let t = equilateral(5.0, 1.0, Color::WHITE);
        let model = model_of(vec![t]).with_translation(Vec3::new(50.0, 0.0, 0.0));
        let mut fb = Framebuffer::new(32, 32);
        let stats = FrameContext::default().render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(stats.clipped, 1);
        assert!(written(&fb).is_empty());
    }

    #[test]
    fn test_model_and_camera_transforms() {
        // triangle at the origin, moved out to z = 10, camera backed up to z = 5
        let model = model_of(vec![equilateral(0.0, 1.0, Color::WHITE)])
            .with_translation(Vec3::new(0.0, 0.0, 10.0));
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let mut fb = Framebuffer::new(100, 100);
        FrameContext::default().render_model(&mut fb, &model, &camera, &AMBIENT);
        assert!((fb.depth(50, 50).unwrap_or(FAR_DEPTH) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_source_mesh_untouched() {
        let model = model_of(vec![equilateral(5.0, 1.0, Color::WHITE)]);
        let before = model.mesh.triangles.clone();
        let mut fb = Framebuffer::new(50, 50);
        FrameContext::default().render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(model.mesh.triangles, before);
    }

    #[test]
    fn test_wireframe_leaves_interior_empty() {
        let model = model_of(vec![equilateral(5.0, 1.0, Color::WHITE)]);
        let settings = RasterSettings { wireframe: true, ..Default::default() };
        let mut fb = Framebuffer::new(100, 100);
        FrameContext::new(settings).render_model(&mut fb, &model, &Camera::default(), &AMBIENT);
        assert_eq!(fb.pixel(50, 50), Some(Color::with_alpha(0, 0, 0, 0)));
        // base edge at y = 47
        assert_eq!(fb.pixel(50, 47), Some(Color::new(102, 102, 102)));
    }

    #[test]
    fn test_wireframe_with_vertices_just_past_near() {
        // the two lower corners project millions of pixels off screen
        let t = Triangle::new([
            Vertex::from_pos(0.0, 1.0, 5.0),
            Vertex::from_pos(2e6, -1.0, 0.11),
            Vertex::from_pos(-2e6, -1.0, 0.11),
        ]);
        let settings = RasterSettings { wireframe: true, backface_cull: false, ..Default::default() };
        let mut fb = Framebuffer::new(320, 240);
        let stats = FrameContext::new(settings).render_model(&mut fb, &model_of(vec![t]), &Camera::default(), &AMBIENT);
        assert_eq!(stats.drawn, 1);
        assert!(fb.pixels.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_pixel_round_trip() {
        let ndc = project_triangle(&equilateral(5.0, 1.0, Color::WHITE), 1.0, 1.0);
        let px = convert_triangle_to_pixel_space(&ndc, 100, 100);
        for (a, b) in ndc.vertices.iter().zip(px.vertices.iter()) {
            let back = pixel_to_ndc(b.pos, 100, 100);
            assert!((back.x - a.pos.x).abs() < 1e-5);
            assert!((back.y - a.pos.y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_stats_add() {
        let mut total = RenderStats::default();
        total += RenderStats { submitted: 3, culled: 1, clipped: 1, drawn: 1 };
        total += RenderStats { submitted: 2, culled: 0, clipped: 0, drawn: 3 };
        assert_eq!(total, RenderStats { submitted: 5, culled: 1, clipped: 1, drawn: 4 });
        assert_eq!(total.to_string(), "5 submitted, 1 culled, 1 clipped, 4 drawn");
    }
}
