//! Drag tracking for the viewer canvas.
//!
//! Raw pointer motion is only forwarded while the primary button is held
//! inside the canvas. Releasing the button or leaving the canvas disarms
//! tracking; whatever was already collected stays with the controller until
//! the next frame consumes it.

use crate::Vec2;
use crate::orbit::PointerDelta;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerState {
    /// Only wheel input reaches the controller.
    #[default]
    Idle,
    /// Button held: move, release and leave are observed.
    Armed,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn button_pressed(&mut self) {
        self.state = PointerState::Armed;
    }

    pub fn button_released(&mut self) {
        self.state = PointerState::Idle;
    }

    pub fn cursor_left(&mut self) {
        self.state = PointerState::Idle;
    }

    /// Feed relative device motion. Returned only while armed.
    pub fn motion(&self, movement: Vec2) -> Option<PointerDelta> {
        (self.state == PointerState::Armed).then(|| PointerDelta::motion(movement.x, movement.y))
    }
}

/// Wheel units per scrolled line.
pub const WHEEL_LINE_UNITS: f32 = 100.0;

/// Convert a line-based scroll (positive = away from the user) into wheel
/// units where positive moves the camera away from the model.
#[inline]
pub fn wheel_from_lines(lines: f32) -> f32 {
    -lines * WHEEL_LINE_UNITS
}

/// Same convention as [`wheel_from_lines`] for pixel-precise devices.
#[inline]
pub fn wheel_from_pixels(pixels: f32) -> f32 {
    -pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::{MouseDelta, OrbitControl};

    #[test]
    fn scrolling_up_zooms_in() {
        assert_eq!(wheel_from_lines(1.0), -100.0);
        assert_eq!(wheel_from_pixels(-40.0), 40.0);
    }

    #[test]
    fn moves_only_count_while_armed() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.motion(Vec2::new(3.0, 0.0)), None);

        tracker.button_pressed();
        assert_eq!(tracker.state(), PointerState::Armed);
        assert_eq!(
            tracker.motion(Vec2::new(10.0, 0.0)),
            Some(PointerDelta::motion(10.0, 0.0))
        );

        tracker.button_released();
        assert_eq!(tracker.state(), PointerState::Idle);
        assert_eq!(tracker.motion(Vec2::new(30.0, 5.0)), None);
    }

    #[test]
    fn released_drag_leaves_controller_untouched() {
        let mut control = OrbitControl::new(1.0, 10.0).unwrap();
        let mut tracker = PointerTracker::new();
        tracker.button_pressed();
        tracker.button_released();

        for step in 1..5 {
            if let Some(delta) = tracker.motion(Vec2::splat(step as f32)) {
                control.collect_mouse_delta(delta);
            }
        }
        assert_eq!(control.pending(), MouseDelta::default());
    }

    #[test]
    fn leaving_canvas_disarms_until_next_press() {
        let mut tracker = PointerTracker::new();
        tracker.button_pressed();
        tracker.cursor_left();
        assert_eq!(tracker.state(), PointerState::Idle);
        assert_eq!(tracker.motion(Vec2::new(1.0, 1.0)), None);

        tracker.button_pressed();
        assert_eq!(
            tracker.motion(Vec2::new(2.0, -1.0)),
            Some(PointerDelta::motion(2.0, -1.0))
        );
    }
}
