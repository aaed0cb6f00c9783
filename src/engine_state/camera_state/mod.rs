//! # Camera State Management
//!
//! Bundles the camera, its projection and the input controller, and exposes
//! the per-frame update the engine drives: fold player actions in, advance
//! the camera by the frame time, and report the new view-projection matrix
//! when anything moved.

use cgmath::{Matrix4, Point3};

use super::PlayerAction;

pub mod camera;

use camera::{Camera, CameraController, Projection};

/// Where the camera wakes up: above the terrain floor, looking out over it.
const STARTING_POSITION: Point3<f32> = Point3::new(8.0, 48.0, 8.0);

/// The complete camera system: state, projection and input handling.
pub struct CameraState {
    camera: Camera,
    projection: Projection,
    controller: CameraController,
}

impl CameraState {
    /// Creates the camera at the starting position for a viewport of the
    /// given pixel size.
    pub fn new(width: u32, height: u32, speed: f32, sensitivity: f32) -> Self {
        Self {
            camera: Camera::new(STARTING_POSITION, cgmath::Deg(-90.0), cgmath::Deg(-20.0)),
            projection: Projection::new(width, height),
            controller: CameraController::new(speed, sensitivity),
        }
    }

    /// Folds one frame's player actions into the controller.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.controller.intake_actions(actions);
    }

    /// Updates the aspect ratio after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    /// Advances the camera by the frame time. Returns `true` when the
    /// camera moved or rotated, so callers can skip uniform uploads on
    /// idle frames.
    pub fn update(&mut self, dt: std::time::Duration) -> bool {
        if !self.controller.has_updates() {
            return false;
        }
        self.camera
            .get_controller_updates_and_reset_controller(&mut self.controller, dt);
        true
    }

    pub fn position(&self) -> Point3<f32> {
        self.camera.position
    }

    /// The combined view-projection matrix for the current camera state.
    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_camera_reports_no_update() {
        let mut state = CameraState::new(800, 600, 10.0, 1.0);
        assert!(!state.update(std::time::Duration::from_millis(16)));
        assert_eq!(state.position(), STARTING_POSITION);
    }

    #[test]
    fn movement_input_updates_the_position() {
        let mut state = CameraState::new(800, 600, 10.0, 1.0);
        state.intake_actions(&PlayerAction {
            move_up: true,
            ..Default::default()
        });
        assert!(state.update(std::time::Duration::from_secs(1)));
        assert!(state.position().y > STARTING_POSITION.y);
    }
}
