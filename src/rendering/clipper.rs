/// Single-plane triangle clipping (Sutherland-Hodgman specialised to
/// triangles). One input triangle yields 0, 1 or 2 output triangles, all on
/// the inside (`distance >= 0`) of the plane.
use crate::count_call;
use crate::math::Plane;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use crate::scene::Triangle;
use glam::Vec3;

/// Up to two clipped triangles in a fixed-size buffer (no allocation).
#[derive(Copy, Clone, Debug)]
pub struct ClippedTriangles {
    len: usize,
    tris: [Triangle; 2],
}

impl ClippedTriangles {
    #[inline]
    fn empty(template: &Triangle) -> Self {
        Self {
            len: 0,
            tris: [*template; 2],
        }
    }

    #[inline]
    fn one(tri: Triangle) -> Self {
        Self {
            len: 1,
            tris: [tri; 2],
        }
    }

    #[inline]
    fn two(a: Triangle, b: Triangle) -> Self {
        Self {
            len: 2,
            tris: [a, b],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Triangle] {
        &self.tris[..self.len]
    }
}

impl<'a> IntoIterator for &'a ClippedTriangles {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

/// Cyclic vertex rotation so that vertex `start` comes first.
/// Preserves winding.
#[inline]
fn rotated(tri: &Triangle, start: usize) -> Triangle {
    let idx = [start % 3, (start + 1) % 3, (start + 2) % 3];
    Triangle {
        positions: idx.map(|i| tri.positions[i]),
        normals: tri.normals.map(|n| idx.map(|i| n[i])),
        color: tri.color,
    }
}

/// Point (and interpolated normal) where edge `a -> b` crosses the plane.
#[inline]
fn edge_intersection(plane: &Plane, tri: &Triangle, a: usize, b: usize) -> Option<(Vec3, Option<Vec3>)> {
    let start = tri.positions[a];
    let end = tri.positions[b];
    let t = plane.intersect_segment(start, end)?;

    let position = start + (end - start) * t;
    let normal = tri
        .normals
        .map(|n| n[a].lerp(n[b], t).normalize_or_zero());
    Some((position, normal))
}

#[inline]
fn assemble(tri: &Triangle, corners: [(Vec3, Option<Vec3>); 3]) -> Triangle {
    let normals = match (corners[0].1, corners[1].1, corners[2].1) {
        (Some(n0), Some(n1), Some(n2)) => Some([n0, n1, n2]),
        _ => None,
    };
    Triangle {
        positions: [corners[0].0, corners[1].0, corners[2].0],
        normals,
        color: tri.color,
    }
}

#[inline]
fn corner(tri: &Triangle, i: usize) -> (Vec3, Option<Vec3>) {
    (tri.positions[i], tri.normals.map(|n| n[i]))
}

/// Clip `tri` against `plane`, keeping the part with non-negative signed
/// distance. Vertices exactly on the plane count as inside.
///
/// A triangle whose intersection cannot be computed (parallel edge, NaN)
/// is dropped.
pub fn clip_triangle(plane: &Plane, tri: &Triangle) -> ClippedTriangles {
    count_call!(FUNCTION_COUNTERS.clip_triangle_calls);
    let inside = tri.positions.map(|p| plane.distance_to_point(p) >= 0.0);
    let inside_count = inside.iter().filter(|&&i| i).count();

    match inside_count {
        0 => ClippedTriangles::empty(tri),
        3 => ClippedTriangles::one(*tri),
        1 => {
            // Rotate so the lone inside vertex is first.
            let start = inside.iter().position(|&i| i).unwrap_or(0);
            let r = rotated(tri, start);

            let (Some(i01), Some(i02)) = (
                edge_intersection(plane, &r, 0, 1),
                edge_intersection(plane, &r, 0, 2),
            ) else {
                return ClippedTriangles::empty(tri);
            };

            ClippedTriangles::one(assemble(&r, [corner(&r, 0), i01, i02]))
        }
        _ => {
            // Rotate so the lone outside vertex is last.
            let outside = inside.iter().position(|&i| !i).unwrap_or(2);
            let r = rotated(tri, outside + 1);

            let (Some(i12), Some(i02)) = (
                edge_intersection(plane, &r, 1, 2),
                edge_intersection(plane, &r, 0, 2),
            ) else {
                return ClippedTriangles::empty(tri);
            };

            count_call!(FUNCTION_COUNTERS.clip_triangle_split);
            // Quad (v0, v1, i12, i02) split along the v0-i12 diagonal.
            let first = assemble(&r, [corner(&r, 0), corner(&r, 1), i12]);
            let second = assemble(&r, [corner(&r, 0), i12, i02]);
            ClippedTriangles::two(first, second)
        }
    }
}
