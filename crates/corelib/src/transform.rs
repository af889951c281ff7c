use crate::{Mat4, Quat, Vec3};

/// Rigid transform with non-uniform scale. Rotation is kept as a quaternion
/// so repeated world-axis rotations do not accumulate Euler drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Rotate about an axis expressed in world space (pre-multiplied).
    /// `axis` must be normalized.
    #[inline]
    pub fn rotate_on_world_axis(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_axis_rotations_compose_left() {
        let mut t = Transform::identity();
        t.rotate_on_world_axis(Vec3::Y, std::f32::consts::FRAC_PI_2);
        t.rotate_on_world_axis(Vec3::X, std::f32::consts::FRAC_PI_2);

        let expected = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(t.rotation.abs_diff_eq(expected, 1e-6));
    }
}
