//! Orbit controller: pointer drag rotates the model about a world axis,
//! the wheel dollies the camera along Z and, past the near bound, narrows
//! the lens instead.

use crate::camera::{Camera, FOV_DEFAULT, FOV_MIN};
use crate::transform::Transform;
use crate::{CoreError, CoreResult, Vec3};

/// Deltas at or below this magnitude are ignored.
pub const EPSILON: f32 = 1e-7;
/// Wheel units are scaled by this when collected and again for lens zoom.
pub const ZOOM_SENSE: f32 = 9.0;
/// Radians of rotation per unit of accumulated pointer travel per second.
pub const MOUSE_SENSE: f32 = 0.8;

/// One raw input sample. `wheel` is `None` for pure pointer moves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerDelta {
    pub x: f32,
    pub y: f32,
    pub wheel: Option<f32>,
}

impl PointerDelta {
    pub fn motion(x: f32, y: f32) -> Self {
        Self { x, y, wheel: None }
    }

    pub fn wheel(delta: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            wheel: Some(delta),
        }
    }
}

/// Input accumulated since the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseDelta {
    pub x: f32,
    pub y: f32,
    pub wheel: f32,
}

impl MouseDelta {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How a frame's wheel input is spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomPhase {
    /// The requested distance is inside `min_dist`: the lens takes the zoom.
    ClippedIn,
    /// The lens is narrower than default and is widened back first.
    RestoringFov,
    /// Plain dolly between the distance bounds.
    Free,
}

impl ZoomPhase {
    pub fn classify(desired_dist: f32, min_dist: f32, fov_deg: f32) -> Self {
        if desired_dist < min_dist {
            ZoomPhase::ClippedIn
        } else if fov_deg < FOV_DEFAULT {
            ZoomPhase::RestoringFov
        } else {
            ZoomPhase::Free
        }
    }
}

#[derive(Debug)]
pub struct OrbitControl {
    min_dist: f32,
    max_dist: f32,
    delta: MouseDelta,
}

impl OrbitControl {
    /// `min_dist` must be positive and not larger than `max_dist`.
    pub fn new(min_dist: f32, max_dist: f32) -> CoreResult<Self> {
        if !(min_dist.is_finite() && max_dist.is_finite()) || min_dist <= 0.0 || min_dist > max_dist
        {
            return Err(CoreError::InvalidZoomBounds { min_dist, max_dist });
        }
        Ok(Self {
            min_dist,
            max_dist,
            delta: MouseDelta::default(),
        })
    }

    #[inline]
    pub fn min_dist(&self) -> f32 {
        self.min_dist
    }

    #[inline]
    pub fn max_dist(&self) -> f32 {
        self.max_dist
    }

    /// Input collected since the last `move_frame`.
    #[inline]
    pub fn pending(&self) -> MouseDelta {
        self.delta
    }

    /// Accumulate one raw input event.
    pub fn collect_mouse_delta(&mut self, delta: PointerDelta) {
        self.delta.x += delta.x;
        self.delta.y += delta.y;
        if let Some(wheel) = delta.wheel.filter(|w| w.is_finite()) {
            self.delta.wheel += wheel * ZOOM_SENSE;
        }
    }

    /// Spend the accumulated input on `object` and `camera`, then clear it.
    pub fn move_frame(&mut self, dt: f32, object: &mut Transform, camera: &mut Camera) {
        let axis = Vec3::new(self.delta.y * dt, self.delta.x * dt, 0.0);
        let len = axis.length();
        if len > EPSILON {
            object.rotate_on_world_axis(axis / len, len * MOUSE_SENSE);
        }

        if self.delta.wheel.abs() > EPSILON {
            self.zoom(dt, camera);
        }

        self.delta.reset();
    }

    fn zoom(&self, dt: f32, camera: &mut Camera) {
        let wheel = self.delta.wheel;
        let z = camera.eye.z;
        let desired = z + wheel * dt * (z / self.max_dist);
        let clamped = desired.clamp(self.min_dist, self.max_dist);

        match ZoomPhase::classify(desired, self.min_dist, camera.fov_deg) {
            ZoomPhase::ClippedIn => {
                camera.fov_deg = lens_step(camera.fov_deg, wheel, dt);
                camera.eye = Vec3::new(0.0, 0.0, clamped);
            }
            ZoomPhase::RestoringFov => {
                camera.fov_deg = lens_step(camera.fov_deg, wheel, dt);
            }
            ZoomPhase::Free => {
                camera.eye = Vec3::new(0.0, 0.0, clamped);
            }
        }

        log::debug!("z: {:.3}, fov: {:.3}", camera.eye.z, camera.fov_deg);
    }
}

fn lens_step(fov: f32, wheel: f32, dt: f32) -> f32 {
    let step = wheel * dt * ZOOM_SENSE * (fov / FOV_DEFAULT) * 0.01;
    (fov + step).clamp(FOV_MIN, FOV_DEFAULT)
}
