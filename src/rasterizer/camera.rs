//! First-person camera

use serde::{Serialize, Deserialize};
use super::math::{Mat4, Point3, Vec3};

/// Pitch stays just short of straight up/down so `right` stays defined
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Camera state. Looks down +z when `rotation` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Point3,
    /// Euler angles in radians (pitch, yaw, roll)
    pub rotation: Vec3,
}

impl Camera {
    pub fn new(position: Point3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Camera space to world space
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::translation(self.position.to_vec()) * Mat4::rotation(self.rotation)
    }

    /// World space to camera space: the exact inverse of `world_matrix`.
    /// Undoes the translation, then Y, Z and X in reverse of the order
    /// `Mat4::rotation` applies them.
    pub fn view_matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::rotation_x(-r.x)
            * Mat4::rotation_z(-r.z)
            * Mat4::rotation_y(-r.y)
            * Mat4::translation(-self.position.to_vec())
    }

    /// Unit vector the camera looks along
    pub fn direction(&self) -> Vec3 {
        Mat4::rotation(self.rotation) * Vec3::FORWARD
    }

    /// Horizontal unit vector to the camera's right
    pub fn right(&self) -> Vec3 {
        Vec3::UP
            .cross(self.direction())
            .try_normalize()
            .unwrap_or_else(|| Mat4::rotation(self.rotation) * Vec3::new(1.0, 0.0, 0.0))
    }

    pub fn move_by(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.direction() * distance;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right() * distance;
    }

    /// Add `delta` to the Euler angles, clamping pitch
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
        self.rotation.x = self.rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Turn to face `target`. Roll is reset. Does nothing if `target` is
    /// the camera position.
    pub fn point_at(&mut self, target: Point3) {
        let d = target - self.position;
        if d.is_zero() {
            return;
        }
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        self.rotation = Vec3::new(
            d.y.atan2(horizontal).clamp(-MAX_PITCH, MAX_PITCH),
            (-d.x).atan2(d.z),
            0.0,
        );
    }
}
