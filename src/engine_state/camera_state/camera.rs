//! # Camera Implementation
//!
//! First-person fly camera: position plus yaw/pitch orientation, a
//! perspective projection, and a controller that folds per-frame input into
//! camera motion.

use cgmath::*;
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use crate::engine_state::terrain::config;
use crate::engine_state::PlayerAction;

/// Depth-range correction from OpenGL-style clip space to WGPU's.
///
/// `cgmath::perspective` produces clip-space Z in `[-1, 1]`; WGPU expects
/// `[0, 1]`. This matrix rescales and shifts Z accordingly and is folded
/// into every projection matrix.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch limit just shy of straight up/down to prevent gimbal lock.
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// A first-person camera in 3D space.
#[derive(Debug)]
pub struct Camera {
    /// The camera's position in world space.
    pub position: Point3<f32>,
    /// Horizontal rotation around Y, in radians.
    pub yaw: Rad<f32>,
    /// Vertical rotation, in radians, clamped short of vertical.
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// The view matrix transforming world coordinates to camera space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(
            self.position,
            Vector3::new(
                self.yaw.0.cos() * self.pitch.0.cos(),
                self.pitch.0.sin(),
                self.yaw.0.sin() * self.pitch.0.cos(),
            )
            .normalize(),
            Vector3::unit_y(),
        )
    }

    /// Applies the controller's accumulated movement and rotation, scaled by
    /// the frame time, then resets the controller for the next frame.
    pub fn get_controller_updates_and_reset_controller(
        &mut self,
        controller: &mut CameraController,
        dt: Duration,
    ) {
        let dt = dt.as_secs_f32();

        // Planar movement follows yaw only, so looking down does not slow
        // forward travel.
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        self.position += forward
            * (controller.amount_forward - controller.amount_backward)
            * controller.speed
            * dt;
        self.position +=
            right * (controller.amount_right - controller.amount_left) * controller.speed * dt;

        self.position.y += (controller.amount_up - controller.amount_down) * controller.speed * dt;

        self.yaw += Rad(controller.rotate_horizontal) * controller.sensitivity * dt;
        self.pitch += Rad(-controller.rotate_vertical) * controller.sensitivity * dt;

        controller.rotate_horizontal = 0.0;
        controller.rotate_vertical = 0.0;
        controller.amount_up = 0.0;
        controller.amount_down = 0.0;
        controller.amount_left = 0.0;
        controller.amount_right = 0.0;
        controller.amount_forward = 0.0;
        controller.amount_backward = 0.0;

        if self.pitch < -Rad(SAFE_FRAC_PI_2) {
            self.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if self.pitch > Rad(SAFE_FRAC_PI_2) {
            self.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }
}

/// Perspective projection with the engine's fixed FOV and clip planes.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    /// Projection for a viewport of the given pixel size; FOV and clip
    /// planes come from `config`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: Deg(config::FOV_DEGREES).into(),
            znear: config::NEAR_PLANE,
            zfar: config::RENDER_DISTANCE,
        }
    }

    /// Updates the aspect ratio after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// The projection matrix, including the WGPU depth-range correction.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Accumulates movement and rotation input between frames.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,

    rotate_horizontal: f32,
    rotate_vertical: f32,

    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Folds one frame's player actions into the accumulated state.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        if actions.move_forward {
            self.amount_forward = 1.0;
        }
        if actions.move_backward {
            self.amount_backward = 1.0;
        }
        if actions.move_left {
            self.amount_left = 1.0;
        }
        if actions.move_right {
            self.amount_right = 1.0;
        }
        if actions.move_up {
            self.amount_up = 1.0;
        }
        if actions.move_down {
            self.amount_down = 1.0;
        }
        if let Some((delta_x, delta_y)) = actions.rotate_view {
            if delta_x.abs() > 0.5 {
                self.rotate_horizontal = delta_x as f32;
            }
            if delta_y.abs() > 0.5 {
                self.rotate_vertical = delta_y as f32;
            }
        }
    }

    /// Whether any accumulated input would move or rotate the camera.
    pub fn has_updates(&self) -> bool {
        self.amount_forward > 0.0
            || self.amount_backward > 0.0
            || self.amount_left > 0.0
            || self.amount_right > 0.0
            || self.amount_up > 0.0
            || self.amount_down > 0.0
            || self.rotate_horizontal != 0.0
            || self.rotate_vertical != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with(actions: PlayerAction) -> CameraController {
        let mut controller = CameraController::new(10.0, 1.0);
        controller.intake_actions(&actions);
        controller
    }

    #[test]
    fn forward_motion_follows_yaw() {
        // Yaw 0 faces +X.
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = controller_with(PlayerAction {
            move_forward: true,
            ..Default::default()
        });
        camera.get_controller_updates_and_reset_controller(
            &mut controller,
            Duration::from_secs(1),
        );
        assert!((camera.position.x - 10.0).abs() < 1e-5);
        assert!(camera.position.y.abs() < 1e-5);
        assert!(camera.position.z.abs() < 1e-5);
    }

    #[test]
    fn vertical_motion_ignores_orientation() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(1.2), Rad(0.9));
        let mut controller = controller_with(PlayerAction {
            move_up: true,
            ..Default::default()
        });
        camera.get_controller_updates_and_reset_controller(
            &mut controller,
            Duration::from_secs(1),
        );
        assert!((camera.position.y - 10.0).abs() < 1e-5);
        assert!(camera.position.x.abs() < 1e-5);
        assert!(camera.position.z.abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_vertical() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = CameraController::new(10.0, 1.0);
        controller.intake_actions(&PlayerAction {
            rotate_view: Some((0.0, -100.0)),
            ..Default::default()
        });
        camera.get_controller_updates_and_reset_controller(
            &mut controller,
            Duration::from_secs(1),
        );
        assert!(camera.pitch.0 <= SAFE_FRAC_PI_2);
        assert!(camera.pitch.0 > 0.0);
    }

    #[test]
    fn controller_resets_after_application() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = controller_with(PlayerAction {
            move_forward: true,
            ..Default::default()
        });
        assert!(controller.has_updates());
        camera.get_controller_updates_and_reset_controller(
            &mut controller,
            Duration::from_secs(1),
        );
        assert!(!controller.has_updates());
    }
}
