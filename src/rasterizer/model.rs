//! Meshes and the models that place them in the world

use std::rc::Rc;
use super::math::{Mat4, Vec3};
use super::types::Triangle;

/// Triangle list loaded once and shared read-only between models
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        Self {
            name: name.into(),
            triangles,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// A mesh plus where it sits in the world
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Rc<Mesh>,
    pub scale: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl Model {
    pub fn new(mesh: Rc<Mesh>) -> Self {
        Self {
            mesh,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Scale, then rotate, then translate
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::translation(self.translation) * Mat4::rotation(self.rotation) * Mat4::scale(self.scale)
    }

    /// Matrix for normals: rotation times inverse scale, so non-uniform
    /// scaling keeps normals perpendicular to their surface. A zero scale
    /// axis flattens the mesh and zeroes that normal component.
    pub fn normal_matrix(&self) -> Mat4 {
        let inv = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
        let s = self.scale;
        Mat4::rotation(self.rotation) * Mat4::scale(Vec3::new(inv(s.x), inv(s.y), inv(s.z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Point3;

    #[test]
    fn test_world_matrix_order() {
        let model = Model::new(Rc::new(Mesh::default()))
            .with_scale(Vec3::new(2.0, 2.0, 2.0))
            .with_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0))
            .with_translation(Vec3::new(0.0, 0.0, 10.0));

        // (0,0,1) -> scale (0,0,2) -> yaw left (-2,0,0) -> translate
        let p = model.world_matrix() * Point3::new(0.0, 0.0, 1.0);
        assert!((p.x + 2.0).abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
        assert!((p.z - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular() {
        let model = Model::new(Rc::new(Mesh::default())).with_scale(Vec3::new(4.0, 1.0, 1.0));
        // surface x = y, normal (1,-1,0)
        let along = model.world_matrix() * Vec3::new(1.0, 1.0, 0.0);
        let normal = model.normal_matrix() * Vec3::new(1.0, -1.0, 0.0);
        assert!(along.dot(normal).abs() < 1e-5);

        let flat = Model::new(Rc::new(Mesh::default())).with_scale(Vec3::new(1.0, 0.0, 1.0));
        let n = flat.normal_matrix() * Vec3::UP;
        assert!(n.is_zero());
    }

    #[test]
    fn test_shared_mesh() {
        let mesh = Rc::new(Mesh::new("tri", Vec::new()));
        let a = Model::new(mesh.clone());
        let b = Model::new(mesh.clone()).with_translation(Vec3::ONE);
        assert!(Rc::ptr_eq(&a.mesh, &b.mesh));
        assert_eq!(Rc::strong_count(&mesh), 3);
        assert!(a.mesh.is_empty());
    }
}
