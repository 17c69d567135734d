/// 4x4 matrix construction for the view and projection transforms.
///
/// All matrices follow glam's column-vector convention (`m * v`), so the
/// row that produces a clip-space component is `m.row(i)`.
use glam::{Mat4, Vec3, Vec4};

/// Axis selector for [`rotation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Rotation about a principal axis by `angle` radians.
#[inline]
pub fn rotation(axis: Axis, angle: f32) -> Mat4 {
    match axis {
        Axis::X => Mat4::from_rotation_x(angle),
        Axis::Y => Mat4::from_rotation_y(angle),
        Axis::Z => Mat4::from_rotation_z(angle),
    }
}

#[inline]
pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Perspective projection for a left-handed view space looking down +z.
///
/// - x is scaled by `f / aspect` and y by `f`, with `f = 1 / tan(fov / 2)`
/// - z is remapped so that `near -> 0` and `far -> 1` after the divide
/// - w carries the original view-space z, which drives the perspective divide
///
/// `aspect` is width / height.
pub fn perspective_projection(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_degrees.to_radians() * 0.5).tan();
    let depth_scale = far / (far - near);

    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, depth_scale, 1.0),
        Vec4::new(0.0, 0.0, -near * depth_scale, 0.0),
    )
}

/// Transform a point and perform the perspective divide.
///
/// When the resulting w is exactly zero the undivided xyz is returned
/// instead of dividing by zero.
#[inline]
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    let clip = *m * p.extend(1.0);
    if clip.w != 0.0 {
        clip.truncate() / clip.w
    } else {
        clip.truncate()
    }
}
