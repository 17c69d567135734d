/// Camera pose, view transform and frustum culling.
/// The pose is the only per-frame input the pipeline takes from the
/// movement/input layer; everything else is derived from it.
use crate::math::Plane;
use glam::{Mat4, Quat, Vec3};

/// Pitch limit in radians (about 86 degrees) to keep the view from flipping.
pub const MAX_PITCH: f32 = 1.5;

/// Observer position and orientation.
///
/// View space is left-handed: +x right, +y up, +z forward. With zero yaw and
/// pitch the camera looks along world +z. Positive yaw turns toward +x,
/// positive pitch tilts the view toward -y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub pitch: f32, // Rotation around X axis (radians)
    pub yaw: f32,   // Rotation around Y axis (radians)
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl CameraPose {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    pub fn with_angles(position: Vec3, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            yaw,
        }
    }

    /// Orientation of the camera in world space (yaw applied after pitch).
    #[inline]
    fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Rotation part of the view transform: `R_x(-pitch) * R_y(-yaw)`.
    /// Also used to carry world-space directions (light, normals) into view space.
    pub fn view_rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(-self.pitch) * Mat4::from_rotation_y(-self.yaw)
    }

    /// World -> view transform: translate by `-position`, then rotate.
    pub fn view_matrix(&self) -> Mat4 {
        self.view_rotation() * Mat4::from_translation(-self.position)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    /// Apply a pitch/yaw delta, clamping pitch to [`MAX_PITCH`].
    pub fn rotate(&mut self, d_pitch: f32, d_yaw: f32) {
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw += d_yaw;
    }

    /// Move relative to the heading. Forward/right ignore pitch (FPS style);
    /// `up` moves along world +y.
    pub fn move_local(&mut self, forward: f32, right: f32, up: f32, distance: f32) {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let flat_forward = Vec3::new(sin_yaw, 0.0, cos_yaw);
        let flat_right = Vec3::new(cos_yaw, 0.0, -sin_yaw);
        let move_vec = flat_forward * forward + flat_right * right + Vec3::Y * up;
        self.position += move_vec * distance;
    }
}

/// View frustum represented as 6 planes, extracted from a view-projection matrix.
/// Plane normals point into the visible volume.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            planes: [Plane::default(); 6],
        }
    }
}

impl Frustum {
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let mut frustum = Self::default();
        frustum.update(vp);
        frustum
    }

    /// Re-derive the planes (Gribb-Hartmann). With glam's column-vector
    /// matrices the clip-space components come from the matrix rows.
    pub fn update(&mut self, vp: &Mat4) {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let coefficients = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row3 + row2, // near
            row3 - row2, // far
        ];

        for (plane, coeff) in self.planes.iter_mut().zip(coefficients) {
            *plane = Plane::from_coefficients(coeff).normalized();
        }
    }

    /// True if the sphere lies entirely behind at least one plane.
    ///
    /// Conservative: a sphere near a frustum corner can pass every plane and
    /// still be invisible, but a visible sphere is never rejected.
    pub fn is_sphere_outside(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .any(|plane| plane.distance_to_point(center) < -radius)
    }
}

/// Camera controller - keyboard state and mouse sensitivity.
pub struct CameraController {
    pub forward_pressed: bool,
    pub backward_pressed: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
    pub sprint_pressed: bool,
    /// World units per second.
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_sensitivity: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            forward_pressed: false,
            backward_pressed: false,
            left_pressed: false,
            right_pressed: false,
            up_pressed: false,
            down_pressed: false,
            sprint_pressed: false,
            move_speed: 6.0,
            sprint_multiplier: 3.0,
            mouse_sensitivity: 0.005,
        }
    }

    /// Update the pose from the pressed keys over `dt` seconds.
    pub fn update_camera(&self, camera: &mut CameraPose, dt: f32) {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;

        let forward = axis(self.forward_pressed, self.backward_pressed);
        let right = axis(self.right_pressed, self.left_pressed);
        let up = axis(self.up_pressed, self.down_pressed);

        let mut speed = self.move_speed;
        if self.sprint_pressed {
            speed *= self.sprint_multiplier;
        }

        camera.move_local(forward, right, up, speed * dt);
    }

    /// Mouse deltas in pixels (screen y grows downward, so moving the mouse
    /// up tilts the view up).
    pub fn apply_mouse(&self, camera: &mut CameraPose, delta_x: f32, delta_y: f32) {
        camera.rotate(delta_y * self.mouse_sensitivity, delta_x * self.mouse_sensitivity);
    }
}
