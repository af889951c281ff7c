use crate::{Mat4, Vec3};

/// Field of view the viewer starts with, in degrees.
pub const FOV_DEFAULT: f32 = 60.0;
/// Narrowest field of view zoom may reach, in degrees.
pub const FOV_MIN: f32 = 5.0;

/// Simple perspective camera (right-handed).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_deg: f32,
        z_near: f32,
        z_far: f32,
        aspect: f32,
    ) -> Self {
        Self {
            eye,
            target,
            up,
            fov_deg,
            z_near,
            z_far,
            aspect,
        }
    }

    /// The viewer's starting camera: 30 units down +Z looking at the origin.
    pub fn viewer_default(aspect: f32) -> Self {
        Self::new_perspective(
            Vec3::new(0.0, 0.0, 30.0),
            Vec3::ZERO,
            Vec3::Y,
            FOV_DEFAULT,
            0.1,
            1_000_000.0,
            aspect,
        )
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// wgpu-style projection (depth in [0, 1]).
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_deg.to_radians(),
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj() * self.view()
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}
