/// Software rasterizer using scanline algorithm
/// Fills screen-space triangles into any depth-tested pixel target
use super::framebuffer::{FrameTile, Framebuffer, TileRect};
use super::shading::shade_color;
use crate::count_call;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use glam::IVec2;

/// Abstraction over a render target that supports depth-tested pixel writes.
pub trait PixelTarget {
    /// Rectangle covered by this target in framebuffer coordinates.
    fn rect(&self) -> TileRect;
    /// Strict depth test at (x, y). On success the depth is stored and the
    /// index for `write_color` is returned.
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize>;
    fn write_color(&mut self, index: usize, color: u32);
}

impl PixelTarget for FrameTile<'_> {
    #[inline]
    fn rect(&self) -> TileRect {
        FrameTile::rect(self)
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        FrameTile::test_depth_and_get_index(self, x, y, depth)
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: u32) {
        FrameTile::write_color(self, index, color);
    }
}

impl PixelTarget for Framebuffer {
    #[inline]
    fn rect(&self) -> TileRect {
        Framebuffer::rect(self)
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        if depth < self.depth_buffer[index] {
            self.depth_buffer[index] = depth;
            Some(index)
        } else {
            None
        }
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: u32) {
        self.color_buffer[index] = color;
    }
}

/// Triangle ready for rasterization: integer pixel corners, NDC depth,
/// per-vertex light intensity and the untinted base color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectedTriangle {
    pub points: [IVec2; 3],
    pub depth: [f32; 3],
    pub light: [f32; 3],
    pub color: u32,
}

impl ProjectedTriangle {
    /// Same light on all three corners.
    pub fn flat(points: [IVec2; 3], depth: [f32; 3], light: f32, color: u32) -> Self {
        Self {
            points,
            depth,
            light: [light; 3],
            color,
        }
    }

    /// Pixel bounding box as `(min, max)`, inclusive of the corner coordinates.
    pub fn bounds(&self) -> (IVec2, IVec2) {
        let [a, b, c] = self.points;
        (a.min(b).min(c), a.max(b).max(c))
    }
}

/// Scanline vertex: position plus the two interpolated attributes.
#[derive(Copy, Clone)]
struct ScanVertex {
    x: f32,
    y: i32,
    z: f32,
    l: f32,
}

/// Linear edge from `top` to `bottom`, evaluated directly at any row so the
/// result never depends on where a tile starts.
#[derive(Copy, Clone)]
struct Edge {
    x: f32,
    y: i32,
    z: f32,
    l: f32,
    dx: f32,
    dz: f32,
    dl: f32,
}

impl Edge {
    fn new(top: ScanVertex, bottom: ScanVertex) -> Self {
        let dy = bottom.y - top.y;
        let inv = if dy == 0 { 0.0 } else { 1.0 / dy as f32 };
        Self {
            x: top.x,
            y: top.y,
            z: top.z,
            l: top.l,
            dx: (bottom.x - top.x) * inv,
            dz: (bottom.z - top.z) * inv,
            dl: (bottom.l - top.l) * inv,
        }
    }

    #[inline]
    fn at(&self, y: i32) -> (f32, f32, f32) {
        let t = (y - self.y) as f32;
        (self.x + self.dx * t, self.z + self.dz * t, self.l + self.dl * t)
    }
}

/// Rasterize every triangle of `queue` in order into `target`.
pub fn rasterize_queue<T: PixelTarget>(queue: &[ProjectedTriangle], target: &mut T) {
    for tri in queue {
        fill_triangle(tri, target);
    }
}

/// Scanline-fill one triangle restricted to `target.rect()`.
///
/// Rows `[y_top, y_bottom)` are covered; on each row the pixels
/// `[ceil(x_left), ceil(x_right))` are depth tested and shaded. Adjacent
/// triangles sharing an edge therefore never both cover a pixel.
pub fn fill_triangle<T: PixelTarget>(tri: &ProjectedTriangle, target: &mut T) {
    count_call!(FUNCTION_COUNTERS.fill_triangle_calls);

    let rect = target.rect();
    let (min, max) = tri.bounds();
    if rect.is_empty()
        || max.x <= rect.x0 as i32
        || min.x >= rect.x1 as i32
        || max.y <= rect.y0 as i32
        || min.y >= rect.y1 as i32
    {
        count_call!(FUNCTION_COUNTERS.fill_triangle_rejected);
        return;
    }

    let mut v: [ScanVertex; 3] = std::array::from_fn(|i| ScanVertex {
        x: tri.points[i].x as f32,
        y: tri.points[i].y,
        z: tri.depth[i],
        l: tri.light[i],
    });
    v.sort_by_key(|p| p.y);
    let [v0, v1, v2] = v;

    let long = Edge::new(v0, v2);
    let upper = Edge::new(v0, v1);
    let lower = Edge::new(v1, v2);

    let row_lo = rect.y0 as i32;
    let row_hi = rect.y1 as i32;

    for (edge, y_start, y_end) in [(upper, v0.y, v1.y), (lower, v1.y, v2.y)] {
        for y in y_start.max(row_lo)..y_end.min(row_hi) {
            let (xa, za, la) = long.at(y);
            let (xb, zb, lb) = edge.at(y);
            fill_span(target, rect, y, (xa, za, la), (xb, zb, lb), tri.color);
        }
    }
}

#[inline]
fn fill_span<T: PixelTarget>(
    target: &mut T,
    rect: TileRect,
    y: i32,
    a: (f32, f32, f32),
    b: (f32, f32, f32),
    color: u32,
) {
    let (left, right) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let (xl, zl, ll) = left;
    let (xr, zr, lr) = right;

    let width = xr - xl;
    if width <= 0.0 {
        return;
    }
    count_call!(FUNCTION_COUNTERS.fill_span_calls);

    let x_start = (xl.ceil() as i32).max(rect.x0 as i32);
    let x_end = (xr.ceil() as i32).min(rect.x1 as i32);
    if x_start >= x_end {
        return;
    }

    let inv_width = 1.0 / width;
    let dz = (zr - zl) * inv_width;
    let dl = (lr - ll) * inv_width;

    for x in x_start..x_end {
        count_call!(FUNCTION_COUNTERS.set_pixel_attempts);
        let offset = x as f32 - xl;
        let z = zl + dz * offset;
        if let Some(idx) = target.test_depth_and_get_index(x as usize, y as usize, z) {
            let light = ll + dl * offset;
            target.write_color(idx, shade_color(color, light));
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_passed);
        } else {
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::framebuffer::SharedFramebuffer;

    struct TestTarget {
        width: usize,
        height: usize,
        color: Vec<u32>,
        depth: Vec<f32>,
        pub pixels_tested: usize,
        pub pixels_written: usize,
    }

    impl TestTarget {
        fn new(width: usize, height: usize) -> Self {
            let len = width * height;
            Self {
                width,
                height,
                color: vec![0; len],
                depth: vec![f32::INFINITY; len],
                pixels_tested: 0,
                pixels_written: 0,
            }
        }
    }

    impl PixelTarget for TestTarget {
        fn rect(&self) -> TileRect {
            TileRect::new(0, 0, self.width, self.height)
        }

        fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
            assert!(x < self.width && y < self.height, "write outside target at {x},{y}");
            self.pixels_tested += 1;
            let idx = y * self.width + x;
            if depth < self.depth[idx] {
                self.depth[idx] = depth;
                Some(idx)
            } else {
                None
            }
        }

        fn write_color(&mut self, index: usize, color: u32) {
            self.color[index] = color;
            self.pixels_written += 1;
        }
    }

    fn tri(points: [(i32, i32); 3], z: f32, color: u32) -> ProjectedTriangle {
        ProjectedTriangle::flat(points.map(|(x, y)| IVec2::new(x, y)), [z; 3], 1.0, color)
    }

    #[test]
    fn right_triangle_covers_expected_pixels() {
        let mut target = TestTarget::new(8, 8);
        fill_triangle(&tri([(0, 0), (4, 0), (0, 4)], 0.5, 0xFF0000), &mut target);
        // Rows 0..4 with 4, 3, 2, 1 pixels.
        assert_eq!(target.pixels_written, 10);
        assert_eq!(target.color[0], 0xFF0000);
        assert_eq!(target.color[3 * 8], 0xFF0000);
        assert_eq!(target.color[3 * 8 + 1], 0);
    }

    #[test]
    fn shared_edge_is_covered_once() {
        let mut target = TestTarget::new(8, 8);
        fill_triangle(&tri([(0, 0), (4, 0), (0, 4)], 0.5, 1), &mut target);
        fill_triangle(&tri([(4, 0), (4, 4), (0, 4)], 0.5, 2), &mut target);
        assert_eq!(target.pixels_tested, 16);
        assert_eq!(target.pixels_written, 16);
        for y in 0..4 {
            for x in 0..4 {
                assert_ne!(target.color[y * 8 + x], 0, "hole at {x},{y}");
            }
        }
    }

    #[test]
    fn nearer_triangle_wins_in_either_order() {
        let near = tri([(0, 0), (8, 0), (0, 8)], 0.2, 0x00FF00);
        let far = tri([(0, 0), (8, 0), (0, 8)], 0.8, 0x0000FF);

        let mut a = TestTarget::new(8, 8);
        fill_triangle(&near, &mut a);
        fill_triangle(&far, &mut a);

        let mut b = TestTarget::new(8, 8);
        fill_triangle(&far, &mut b);
        fill_triangle(&near, &mut b);

        assert_eq!(a.color, b.color);
        assert_eq!(a.color[0], 0x00FF00);
    }

    #[test]
    fn light_tints_base_color() {
        let mut target = TestTarget::new(4, 4);
        let t = ProjectedTriangle::flat(
            [IVec2::new(0, 0), IVec2::new(4, 0), IVec2::new(0, 4)],
            [0.5; 3],
            0.5,
            0xFF8040,
        );
        fill_triangle(&t, &mut target);
        assert_eq!(target.color[0], shade_color(0xFF8040, 0.5));
    }

    #[test]
    fn degenerate_triangle_writes_nothing() {
        let mut target = TestTarget::new(8, 8);
        fill_triangle(&tri([(0, 2), (7, 2), (3, 2)], 0.5, 1), &mut target);
        fill_triangle(&tri([(1, 1), (1, 1), (1, 1)], 0.5, 1), &mut target);
        assert_eq!(target.pixels_tested, 0);
    }

    #[test]
    fn offscreen_triangle_is_rejected() {
        let mut target = TestTarget::new(8, 8);
        fill_triangle(&tri([(-20, -20), (-10, -20), (-20, -10)], 0.5, 1), &mut target);
        fill_triangle(&tri([(8, 0), (12, 0), (8, 4)], 0.5, 1), &mut target);
        assert_eq!(target.pixels_tested, 0);
    }

    #[test]
    fn partially_offscreen_triangle_stays_in_bounds() {
        // TestTarget asserts on any out-of-range access.
        let mut target = TestTarget::new(8, 8);
        fill_triangle(&tri([(-5, -3), (20, 2), (3, 15)], 0.5, 1), &mut target);
        assert!(target.pixels_written > 0);
    }

    #[test]
    fn depth_is_interpolated_across_span() {
        let mut target = TestTarget::new(8, 8);
        let t = ProjectedTriangle {
            points: [IVec2::new(0, 0), IVec2::new(8, 0), IVec2::new(0, 8)],
            depth: [0.0, 0.8, 0.0],
            light: [1.0; 3],
            color: 1,
        };
        fill_triangle(&t, &mut target);
        let row = &target.depth[0..8];
        assert_eq!(row[0], 0.0);
        assert!(row.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn tiled_fill_matches_full_fill() {
        let queue = [
            tri([(1, 1), (30, 4), (6, 29)], 0.4, 0xAA0000),
            tri([(31, 0), (31, 31), (0, 16)], 0.3, 0x00AA00),
        ];

        let mut full = Framebuffer::new(32, 32);
        rasterize_queue(&queue, &mut full);

        let mut tiled = Framebuffer::new(32, 32);
        {
            let shared = SharedFramebuffer::new(&mut tiled);
            for ty in (0..32).step_by(10) {
                for tx in (0..32).step_by(10) {
                    let mut tile = unsafe { shared.tile(TileRect::new(tx, ty, tx + 10, ty + 10)) };
                    rasterize_queue(&queue, &mut tile);
                }
            }
        }

        assert_eq!(full.color_buffer, tiled.color_buffer);
        assert_eq!(full.depth_buffer, tiled.depth_buffer);
    }
}
