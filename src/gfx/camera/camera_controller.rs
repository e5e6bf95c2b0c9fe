use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta},
    keyboard::KeyCode,
};

use super::free_camera::Camera;

/// Per-button drag bookkeeping: the cursor position seen on the
/// previous frame while the button was held.
#[derive(Debug, Default, Clone, Copy)]
struct DragState {
    last_position: Option<(f64, f64)>,
}

/// Translates winit input into camera updates.
///
/// Left-drag orbits the focal object (phi/theta), right-drag
/// free-looks (pitch/yaw), the wheel and W/S move along the front
/// vector, A/D yaw, R resets.
pub struct CameraController {
    pub look_sensitivity: f32,
    pub move_speed: f32,
    pub yaw_speed: f32,
    left_drag: DragState,
    right_drag: DragState,
    cursor_position: (f64, f64),
}

impl CameraController {
    pub fn new(look_sensitivity: f32, move_speed: f32) -> Self {
        Self {
            look_sensitivity,
            move_speed,
            yaw_speed: 60.0,
            left_drag: DragState::default(),
            right_drag: DragState::default(),
            cursor_position: (0.0, 0.0),
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let drag = match button {
            MouseButton::Left => &mut self.left_drag,
            MouseButton::Right => &mut self.right_drag,
            _ => return,
        };

        match state {
            // The drag anchors at the position where the press landed.
            ElementState::Pressed => drag.last_position = Some(self.cursor_position),
            ElementState::Released => drag.last_position = None,
        }
    }

    pub fn process_cursor_moved(&mut self, position: PhysicalPosition<f64>, camera: &mut Camera) {
        let current = (position.x, position.y);
        self.cursor_position = current;

        if let Some(last) = self.right_drag.last_position {
            let delta_pitch = (current.1 - last.1) as f32 * self.look_sensitivity;
            let delta_yaw = (current.0 - last.0) as f32 * self.look_sensitivity;
            camera.update_look(delta_pitch, delta_yaw, true);
            self.right_drag.last_position = Some(current);
        }

        if let Some(last) = self.left_drag.last_position {
            let delta_phi = (current.1 - last.1) as f32 * self.look_sensitivity;
            let delta_theta = (current.0 - last.0) as f32 * self.look_sensitivity;
            camera.update_object(delta_phi, delta_theta, true);
            self.left_drag.last_position = Some(current);
        }
    }

    pub fn process_scroll(&mut self, delta: MouseScrollDelta, camera: &mut Camera) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, scroll) => scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                scroll as f32 * 0.05
            }
        };
        camera.update_forward(amount);
    }

    /// Handles held movement keys; `delta_time` is the seconds elapsed
    /// since the previous frame.
    pub fn process_key(&mut self, key: KeyCode, delta_time: f32, camera: &mut Camera) {
        match key {
            KeyCode::KeyW => camera.update_forward(self.move_speed * delta_time),
            KeyCode::KeyS => camera.update_forward(-self.move_speed * delta_time),
            KeyCode::KeyA => camera.update_look(0.0, -self.yaw_speed * delta_time, true),
            KeyCode::KeyD => camera.update_look(0.0, self.yaw_speed * delta_time, true),
            KeyCode::KeyR => camera.reset(),
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(controller: &mut CameraController, camera: &mut Camera, x: f64, y: f64) {
        controller.process_cursor_moved(PhysicalPosition::new(x, y), camera);
    }

    #[test]
    fn right_drag_updates_look_angles() {
        let mut controller = CameraController::new(0.1, 2.5);
        let mut camera = Camera::new();

        moved(&mut controller, &mut camera, 100.0, 100.0);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        moved(&mut controller, &mut camera, 130.0, 120.0);

        assert!((camera.yaw - 3.0).abs() < 1e-4);
        assert!((camera.pitch - 2.0).abs() < 1e-4);
        assert_eq!(camera.phi, 0.0);
        assert_eq!(camera.theta, 0.0);
    }

    #[test]
    fn left_drag_updates_orbit_angles() {
        let mut controller = CameraController::new(0.1, 2.5);
        let mut camera = Camera::new();

        moved(&mut controller, &mut camera, 50.0, 50.0);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        moved(&mut controller, &mut camera, 40.0, 80.0);

        assert!((camera.theta + 1.0).abs() < 1e-4);
        assert!((camera.phi - 3.0).abs() < 1e-4);
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn released_button_stops_tracking() {
        let mut controller = CameraController::new(0.1, 2.5);
        let mut camera = Camera::new();

        moved(&mut controller, &mut camera, 0.0, 0.0);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        moved(&mut controller, &mut camera, 10.0, 0.0);
        controller.process_mouse_button(MouseButton::Right, ElementState::Released);
        moved(&mut controller, &mut camera, 500.0, 500.0);

        assert!((camera.yaw - 1.0).abs() < 1e-4);
    }
}
