/// Triangle meshes with an always-current bounding sphere.
use glam::Vec3;

/// Default triangle color (white, 0xRRGGBB).
pub const DEFAULT_COLOR: u32 = 0xFFFFFF;

/// A single triangle: positions, optional per-vertex normals and a packed
/// 24-bit color (0xRRGGBB).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: Option<[Vec3; 3]>,
    pub color: u32,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, color: u32) -> Self {
        Self {
            positions: [v0, v1, v2],
            normals: None,
            color: color & 0xFFFFFF,
        }
    }

    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Face normal for the renderer's winding convention: a triangle wound
    /// counter-clockwise as seen by the viewer faces the viewer.
    /// Returns `Vec3::ZERO` for degenerate triangles.
    #[inline]
    pub fn face_normal(&self) -> Vec3 {
        let [v0, v1, v2] = self.positions;
        (v2 - v0).cross(v1 - v0).normalize_or_zero()
    }

    #[inline]
    pub fn area(&self) -> f32 {
        let [v0, v1, v2] = self.positions;
        (v1 - v0).cross(v2 - v0).length() * 0.5
    }

    /// Same triangle with the opposite winding (v1 and v2 swapped).
    pub fn flipped(&self) -> Self {
        let [v0, v1, v2] = self.positions;
        Self {
            positions: [v0, v2, v1],
            normals: self.normals.map(|[n0, n1, n2]| [n0, n2, n1]),
            color: self.color,
        }
    }
}

/// Sphere enclosing every vertex of a mesh.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub const EMPTY: Self = Self {
        center: Vec3::ZERO,
        radius: 0.0,
    };

    /// Center = centroid of all vertices, radius = farthest vertex from it.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        if triangles.is_empty() {
            return Self::EMPTY;
        }

        let vertex_count = (triangles.len() * 3) as f32;
        let sum: Vec3 = triangles
            .iter()
            .flat_map(|tri| tri.positions)
            .fold(Vec3::ZERO, |acc, v| acc + v);
        let center = sum / vertex_count;

        let radius_sq = triangles
            .iter()
            .flat_map(|tri| tri.positions)
            .map(|v| v.distance_squared(center))
            .fold(0.0f32, f32::max);

        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.distance(self.center) <= self.radius * (1.0 + 1e-5) + 1e-5
    }
}

/// Ordered triangle list plus its bounding sphere.
///
/// Fields are private so every geometry change goes through a method that
/// recomputes the bounds; the sphere is never stale.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bounds: BoundingSphere,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let bounds = BoundingSphere::from_triangles(&triangles);
        Self { triangles, bounds }
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
        self.recalculate_bounds();
    }

    pub fn extend<I: IntoIterator<Item = Triangle>>(&mut self, triangles: I) {
        self.triangles.extend(triangles);
        self.recalculate_bounds();
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for tri in &mut self.triangles {
            for v in &mut tri.positions {
                *v += offset;
            }
        }
        self.recalculate_bounds();
    }

    /// Recolor every triangle.
    pub fn with_color(mut self, color: u32) -> Self {
        for tri in &mut self.triangles {
            tri.color = color & 0xFFFFFF;
        }
        self
    }

    fn recalculate_bounds(&mut self) {
        self.bounds = BoundingSphere::from_triangles(&self.triangles);
    }
}
