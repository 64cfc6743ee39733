//! Transform
//!
//! Position, rotation, and scale with a cached world matrix. Mutation through
//! the setter API re-derives the matrix immediately; writing the public
//! fields directly requires an explicit [`Transform::apply`] before the
//! matrix is read again.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    matrix: Mat4,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Mat4::IDENTITY,
        }
    }

    /// Re-derives the cached matrix from the current TRS fields.
    ///
    /// The cached matrix composes as `translate * rotate * scale`.
    pub fn apply(&mut self) {
        self.matrix = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
    }

    /// The cached `translate * rotate * scale` matrix.
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.apply();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.apply();
    }

    /// Sets the rotation from an axis and an angle in radians.
    pub fn set_rotation_axis_angle(&mut self, axis: Vec3, angle: f32) {
        self.set_rotation(Quat::from_axis_angle(axis, angle));
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.apply();
    }

    /// Moves the transform by `offset` in world space.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.apply();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
