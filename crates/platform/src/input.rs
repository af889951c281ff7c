//! winit events to orbit controller input.
//!
//! Nothing is routed until the model is loaded and a controller exists.
//! Button, leave and wheel come from window events; drag motion comes from
//! raw device motion, which is not bounded by the cursor position.

use corelib::{
    Vec2,
    orbit::{OrbitControl, PointerDelta},
    pointer::{PointerTracker, wheel_from_lines, wheel_from_pixels},
};
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};

pub fn route_window_input(
    event: &WindowEvent,
    pointer: &mut PointerTracker,
    control: Option<&mut OrbitControl>,
) {
    let Some(control) = control else {
        return;
    };
    match event {
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => match state {
            ElementState::Pressed => pointer.button_pressed(),
            ElementState::Released => pointer.button_released(),
        },
        WindowEvent::CursorLeft { .. } => pointer.cursor_left(),
        WindowEvent::MouseWheel { delta, .. } => {
            control.collect_mouse_delta(PointerDelta::wheel(wheel_units(delta)));
        }
        _ => {}
    }
}

pub fn route_device_input(
    event: &DeviceEvent,
    pointer: &PointerTracker,
    control: Option<&mut OrbitControl>,
) {
    let (Some(control), DeviceEvent::MouseMotion { delta: (dx, dy) }) = (control, event) else {
        return;
    };
    if let Some(delta) = pointer.motion(Vec2::new(*dx as f32, *dy as f32)) {
        control.collect_mouse_delta(delta);
    }
}

fn wheel_units(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => wheel_from_lines(*y),
        MouseScrollDelta::PixelDelta(pos) => wheel_from_pixels(pos.y as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::orbit::{MouseDelta, ZOOM_SENSE};
    use corelib::pointer::PointerState;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    fn device() -> DeviceId {
        // SAFETY: only compared against other dummy ids, never passed to the platform.
        unsafe { DeviceId::dummy() }
    }

    fn button(state: ElementState, button: MouseButton) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button,
        }
    }

    fn wheel(delta: MouseScrollDelta) -> WindowEvent {
        WindowEvent::MouseWheel {
            device_id: device(),
            delta,
            phase: TouchPhase::Moved,
        }
    }

    fn motion(dx: f64, dy: f64) -> DeviceEvent {
        DeviceEvent::MouseMotion { delta: (dx, dy) }
    }

    fn control() -> OrbitControl {
        OrbitControl::new(2.0, 500.0).unwrap()
    }

    #[test]
    fn input_before_model_load_is_dropped() {
        let mut pointer = PointerTracker::new();
        route_window_input(
            &button(ElementState::Pressed, MouseButton::Left),
            &mut pointer,
            None,
        );
        route_device_input(&motion(5.0, 5.0), &pointer, None);
        assert_eq!(pointer.state(), PointerState::Idle);
    }

    #[test]
    fn only_primary_button_arms_drag() {
        let mut pointer = PointerTracker::new();
        let mut control = control();

        route_window_input(
            &button(ElementState::Pressed, MouseButton::Right),
            &mut pointer,
            Some(&mut control),
        );
        route_device_input(&motion(4.0, 0.0), &pointer, Some(&mut control));
        assert_eq!(control.pending(), MouseDelta::default());

        route_window_input(
            &button(ElementState::Pressed, MouseButton::Left),
            &mut pointer,
            Some(&mut control),
        );
        route_device_input(&motion(10.0, 0.0), &pointer, Some(&mut control));
        assert_eq!(
            control.pending(),
            MouseDelta {
                x: 10.0,
                y: 0.0,
                wheel: 0.0
            }
        );
    }

    #[test]
    fn mouse_up_stops_motion_reaching_controller() {
        let mut pointer = PointerTracker::new();
        let mut control = control();
        route_window_input(
            &button(ElementState::Pressed, MouseButton::Left),
            &mut pointer,
            Some(&mut control),
        );
        route_window_input(
            &button(ElementState::Released, MouseButton::Left),
            &mut pointer,
            Some(&mut control),
        );
        for _ in 0..3 {
            route_device_input(&motion(7.0, -2.0), &pointer, Some(&mut control));
        }
        assert_eq!(control.pending(), MouseDelta::default());
    }

    #[test]
    fn wheel_deltas_use_away_positive_convention() {
        let mut pointer = PointerTracker::new();
        let mut control = control();

        // One line scrolled up zooms in.
        route_window_input(
            &wheel(MouseScrollDelta::LineDelta(0.0, 1.0)),
            &mut pointer,
            Some(&mut control),
        );
        assert_eq!(control.pending().wheel, -100.0 * ZOOM_SENSE);

        let mut control = self::control();
        route_window_input(
            &wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0))),
            &mut pointer,
            Some(&mut control),
        );
        assert_eq!(control.pending().wheel, 40.0 * ZOOM_SENSE);
    }
}
