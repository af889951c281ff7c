//! Core types: math re-exports, Transform, Camera, frame clock and the
//! orbit controller. Renderer- and window-agnostic.

pub use glam::{Mat4, Quat, Vec2, Vec3, vec3};
use thiserror::Error;

pub mod camera;
pub mod clock;
pub mod orbit;
pub mod pointer;
pub mod transform;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid zoom bounds: min_dist={min_dist}, max_dist={max_dist}")]
    InvalidZoomBounds { min_dist: f32, max_dist: f32 },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_scales_then_rotates_then_translates() {
        let t = transform::Transform::from_trs(
            vec3(1.0, 2.0, 3.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::splat(2.0),
        );
        // +X scaled to 2, turned a quarter about +Y onto -Z, then offset.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(vec3(1.0, 2.0, 1.0), 1e-5));
    }

    #[test]
    fn orbiting_keeps_translation_and_scale() {
        let mut t = transform::Transform::from_trs(vec3(0.0, 0.0, -4.0), Quat::IDENTITY, Vec3::ONE);
        t.rotate_on_world_axis(Vec3::X, 1.0);
        t.rotate_on_world_axis(Vec3::Y, -0.5);
        let (scale, rotation, translation) = t.matrix().to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(Vec3::ONE, 1e-5));
        assert!(translation.abs_diff_eq(vec3(0.0, 0.0, -4.0), 1e-5));
        assert!((rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::viewer_default(16.0 / 9.0);
        let pv = cam.proj_view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn zoom_bounds_error_names_both_limits() {
        let err = orbit::OrbitControl::new(5.0, 1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid zoom bounds: min_dist=5, max_dist=1"
        );
    }
}
