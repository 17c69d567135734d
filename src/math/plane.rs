use glam::{Vec3, Vec4};

/// Plane in Hessian form: `dot(normal, p) + d = 0`.
/// Points with a positive signed distance are in front of the plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            d: 0.0,
        }
    }
}

impl Plane {
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through `point` facing along `normal`.
    #[inline]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane from packed `(a, b, c, d)` coefficients.
    #[inline]
    pub fn from_coefficients(v: Vec4) -> Self {
        Self {
            normal: v.truncate(),
            d: v.w,
        }
    }

    /// Rescale so the normal has unit length. Leaves a zero normal untouched.
    #[inline]
    pub fn normalize(&mut self) {
        let len = self.normal.length();
        if len > 0.0 {
            self.normal /= len;
            self.d /= len;
        }
    }

    #[inline]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Signed distance from `p` to the plane; positive means in front.
    /// Only metric once the plane is normalized.
    #[inline]
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// Parameter `t` along `start -> end` where the segment meets the plane.
    /// Returns `None` when the segment is parallel to the plane.
    #[inline]
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Option<f32> {
        let denom = (end - start).dot(self.normal);
        if denom == 0.0 {
            return None;
        }
        let t = (-self.d - start.dot(self.normal)) / denom;
        t.is_finite().then_some(t)
    }
}
