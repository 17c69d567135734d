/// Serial geometry phase: mesh triangles in, screen-space render queue out.
///
/// Per mesh: build the view transform, refresh the frustum and reject the
/// mesh on its bounding sphere. Per triangle: view transform, near-plane
/// clip, back-face test, lighting, projection and screen mapping.
use super::clipper::clip_triangle;
use super::rasterizer::ProjectedTriangle;
use super::shading::{ShadingConfig, ShadingMode};
use crate::camera::{CameraPose, Frustum};
use crate::math::{perspective_projection, transform_point, Plane};
use crate::scene::{Mesh, Triangle};
use glam::{IVec2, Mat4, Vec3};

/// Projected coordinates are clamped to this many pixels from the origin so
/// the scanline edge arithmetic stays well inside `i32`.
const GUARD_BAND: f32 = (1 << 24) as f32;

/// Counters for one frame, reset by `begin_frame`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes_submitted: usize,
    pub meshes_culled: usize,
    pub triangles_tested: usize,
    /// Source triangles entirely in front of the near plane.
    pub triangles_clipped: usize,
    pub triangles_backface_culled: usize,
    /// Zero-area pieces and non-finite projections.
    pub triangles_degenerate: usize,
    pub triangles_queued: usize,
    pub tiles_rasterized: usize,
    pub tile_failures: usize,
}

pub struct GeometryPipeline {
    width: usize,
    height: usize,
    projection: Mat4,
    near_plane: Plane,
    frustum: Frustum,
    pub shading: ShadingConfig,
    pub shading_mode: ShadingMode,
    queue: Vec<ProjectedTriangle>,
}

impl GeometryPipeline {
    pub fn new(
        width: usize,
        height: usize,
        fov_degrees: f32,
        near: f32,
        far: f32,
        shading: ShadingConfig,
        shading_mode: ShadingMode,
    ) -> Self {
        let mut pipeline = Self {
            width,
            height,
            projection: Mat4::IDENTITY,
            near_plane: Plane::default(),
            frustum: Frustum::default(),
            shading,
            shading_mode,
            queue: Vec::new(),
        };
        pipeline.set_viewport(width, height, fov_degrees, near, far);
        pipeline
    }

    /// Rebuild the projection for a new target size or clip range.
    pub fn set_viewport(&mut self, width: usize, height: usize, fov_degrees: f32, near: f32, far: f32) {
        self.width = width;
        self.height = height;
        let aspect = width as f32 / height.max(1) as f32;
        self.projection = perspective_projection(fov_degrees, aspect, near, far);
        self.near_plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, near), Vec3::Z);
    }

    #[inline]
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    #[inline]
    pub fn queue(&self) -> &[ProjectedTriangle] {
        &self.queue
    }

    /// Drop the queued triangles, keeping the allocation for the next frame.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Run the geometry phase for one mesh. Returns false if the whole mesh
    /// was rejected by the frustum test.
    pub fn submit_mesh(&mut self, mesh: &Mesh, camera: &CameraPose, stats: &mut FrameStats) -> bool {
        stats.meshes_submitted += 1;

        let view = camera.view_matrix();
        self.frustum.update(&(self.projection * view));

        let bounds = mesh.bounds();
        if mesh.is_empty() || self.frustum.is_sphere_outside(bounds.center, bounds.radius) {
            stats.meshes_culled += 1;
            return false;
        }

        let rotation = camera.view_rotation();
        let to_light = rotation
            .transform_vector3(self.shading.sun_direction)
            .normalize_or_zero();

        for tri in mesh.triangles() {
            self.process_triangle(tri, &view, &rotation, to_light, stats);
        }
        true
    }

    fn process_triangle(
        &mut self,
        tri: &Triangle,
        view: &Mat4,
        rotation: &Mat4,
        to_light: Vec3,
        stats: &mut FrameStats,
    ) {
        stats.triangles_tested += 1;

        let view_tri = Triangle {
            positions: tri.positions.map(|p| view.transform_point3(p)),
            normals: tri
                .normals
                .map(|ns| ns.map(|n| rotation.transform_vector3(n).normalize_or_zero())),
            color: tri.color,
        };

        let clipped = clip_triangle(&self.near_plane, &view_tri);
        if clipped.is_empty() {
            stats.triangles_clipped += 1;
            return;
        }

        for piece in &clipped {
            let normal = piece.face_normal();
            if normal == Vec3::ZERO {
                stats.triangles_degenerate += 1;
                continue;
            }

            // Eye sits at the origin, so v0 is the view ray to the triangle.
            if normal.dot(piece.positions[0]) >= 0.0 {
                stats.triangles_backface_culled += 1;
                continue;
            }

            let light = self.light_triangle(piece, normal, to_light);
            match self.project(piece, light) {
                Some(projected) => {
                    self.queue.push(projected);
                    stats.triangles_queued += 1;
                }
                None => stats.triangles_degenerate += 1,
            }
        }
    }

    fn light_triangle(&self, tri: &Triangle, face_normal: Vec3, to_light: Vec3) -> [f32; 3] {
        match (self.shading_mode, tri.normals) {
            (ShadingMode::Gouraud, Some(normals)) => {
                normals.map(|n| self.shading.intensity(n, to_light))
            }
            _ => [self.shading.intensity(face_normal, to_light); 3],
        }
    }

    /// Perspective-project a view-space triangle and map it to pixels.
    /// `None` if any coordinate is not finite.
    fn project(&self, tri: &Triangle, light: [f32; 3]) -> Option<ProjectedTriangle> {
        let w = self.width as f32;
        let h = self.height as f32;

        let mut points = [IVec2::ZERO; 3];
        let mut depth = [0.0; 3];
        for (i, &p) in tri.positions.iter().enumerate() {
            let ndc = transform_point(&self.projection, p);
            let sx = ((ndc.x + 1.0) * 0.5 * w).round();
            let sy = ((1.0 - ndc.y) * 0.5 * h).round();
            if !(sx.is_finite() && sy.is_finite() && ndc.z.is_finite()) {
                return None;
            }
            points[i] = IVec2::new(
                sx.clamp(-GUARD_BAND, GUARD_BAND) as i32,
                sy.clamp(-GUARD_BAND, GUARD_BAND) as i32,
            );
            depth[i] = ndc.z;
        }

        Some(ProjectedTriangle {
            points,
            depth,
            light,
            color: tri.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(width: usize, height: usize) -> GeometryPipeline {
        GeometryPipeline::new(
            width,
            height,
            90.0,
            0.1,
            1000.0,
            ShadingConfig {
                sun_direction: Vec3::NEG_Z,
                ambient: 0.2,
                contrast_exponent: 1.0,
            },
            ShadingMode::Flat,
        )
    }

    fn facing_triangle(z: f32) -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(0.0, 1.0, z),
            0xFFFFFF,
        )
    }

    #[test]
    fn facing_triangle_is_queued_fully_lit() {
        let mut p = pipeline(100, 100);
        let mut stats = FrameStats::default();
        let mesh = Mesh::new(vec![facing_triangle(5.0)]);
        assert!(p.submit_mesh(&mesh, &CameraPose::default(), &mut stats));

        assert_eq!(stats.triangles_queued, 1);
        let q = p.queue()[0];
        assert_eq!(q.light, [1.0; 3]);
        // x = +-1/5 in NDC -> 50 -+ 10 px; y = -1/5 -> row 60, +1/5 -> row 40.
        assert_eq!(q.points, [IVec2::new(40, 60), IVec2::new(60, 60), IVec2::new(50, 40)]);
    }

    #[test]
    fn reversed_winding_is_culled() {
        let mut p = pipeline(100, 100);
        let mut stats = FrameStats::default();
        let mesh = Mesh::new(vec![facing_triangle(5.0).flipped()]);
        p.submit_mesh(&mesh, &CameraPose::default(), &mut stats);
        assert_eq!(stats.triangles_backface_culled, 1);
        assert!(p.queue().is_empty());
    }

    #[test]
    fn triangle_crossing_near_plane_is_split() {
        let mut p = pipeline(64, 64);
        let mut stats = FrameStats::default();
        // One vertex behind the camera.
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 3.0),
            Vec3::new(1.0, -1.0, 3.0),
            Vec3::new(0.0, 1.0, -1.0),
            0x00FF00,
        );
        let mesh = Mesh::new(vec![tri, tri.flipped()]);
        p.submit_mesh(&mesh, &CameraPose::default(), &mut stats);
        assert_eq!(stats.triangles_tested, 2);
        assert_eq!(stats.triangles_queued + stats.triangles_backface_culled, 4);
        assert!(p
            .queue()
            .iter()
            .all(|t| t.depth.iter().all(|d| (-1e-4..=1.0).contains(d))));
    }

    #[test]
    fn triangle_behind_camera_is_clipped_away() {
        let mut p = pipeline(64, 64);
        let mut stats = FrameStats::default();
        let mesh = Mesh::new(vec![facing_triangle(5.0), facing_triangle(-5.0)]);
        p.submit_mesh(&mesh, &CameraPose::default(), &mut stats);
        assert_eq!(stats.triangles_clipped, 1);
        assert_eq!(stats.triangles_queued, 1);
    }

    #[test]
    fn mesh_behind_camera_is_frustum_culled() {
        let mut p = pipeline(64, 64);
        let mut stats = FrameStats::default();
        let mesh = Mesh::new(vec![facing_triangle(-50.0)]);
        assert!(!p.submit_mesh(&mesh, &CameraPose::default(), &mut stats));
        assert_eq!(stats.meshes_culled, 1);
        assert_eq!(stats.triangles_tested, 0);
    }

    #[test]
    fn gouraud_uses_vertex_normals() {
        let mut p = pipeline(64, 64);
        p.shading_mode = ShadingMode::Gouraud;
        let mut stats = FrameStats::default();
        let tri = facing_triangle(5.0).with_normals([Vec3::NEG_Z, Vec3::X, Vec3::Z]);
        p.submit_mesh(&Mesh::new(vec![tri]), &CameraPose::default(), &mut stats);
        let q = p.queue()[0];
        assert_eq!(q.light[0], 1.0);
        assert!((q.light[1] - 0.2).abs() < 1e-6);
        assert!((q.light[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn degenerate_triangle_is_skipped() {
        let mut p = pipeline(64, 64);
        let mut stats = FrameStats::default();
        let v = Vec3::new(0.0, 0.0, 5.0);
        let line = Triangle::new(v, v + Vec3::X, v + Vec3::X * 2.0, 1);
        p.submit_mesh(&Mesh::new(vec![line, facing_triangle(5.0)]), &CameraPose::default(), &mut stats);
        assert_eq!(stats.triangles_degenerate, 1);
        assert_eq!(stats.triangles_queued, 1);
    }

    #[test]
    fn clear_queue_keeps_capacity() {
        let mut p = pipeline(64, 64);
        let mut stats = FrameStats::default();
        let mesh = Mesh::new(vec![facing_triangle(5.0); 8]);
        p.submit_mesh(&mesh, &CameraPose::default(), &mut stats);
        let capacity = p.queue.capacity();
        p.clear_queue();
        assert!(p.queue().is_empty());
        assert_eq!(p.queue.capacity(), capacity);
    }
}
