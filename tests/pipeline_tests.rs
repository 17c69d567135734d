/// End-to-end behaviour of the geometry phase and the full renderer.
use glam::{IVec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use raster_engine::rendering::{shade_color, GeometryPipeline, DEFAULT_CLEAR_COLOR};
use raster_engine::*;

fn test_shading() -> ShadingConfig {
    ShadingConfig {
        sun_direction: Vec3::NEG_Z,
        ambient: 0.2,
        contrast_exponent: 1.0,
    }
}

fn renderer(width: usize, height: usize, workers: usize) -> Renderer {
    Renderer::new(RendererConfig {
        width,
        height,
        tile_size: 16,
        worker_threads: Some(workers),
        shading: test_shading(),
        shading_mode: ShadingMode::Flat,
        ..RendererConfig::default()
    })
    .unwrap()
}

fn pipeline(width: usize, height: usize) -> GeometryPipeline {
    GeometryPipeline::new(width, height, 90.0, 0.1, 1000.0, test_shading(), ShadingMode::Flat)
}

fn reference_triangle(color: u32, z: f32) -> Triangle {
    Triangle::new(
        Vec3::new(-1.0, -1.0, z),
        Vec3::new(1.0, -1.0, z),
        Vec3::new(0.0, 1.0, z),
        color,
    )
}

#[test]
fn reference_triangle_renders_centered_and_fully_lit() {
    let mut renderer = renderer(100, 100, 2);
    let mesh = Mesh::new(vec![reference_triangle(0xFFFFFF, 5.0)]);

    let stats = renderer.render_frame([&mesh], &CameraPose::default());
    assert_eq!(stats.triangles_tested, 1);
    assert_eq!(stats.triangles_clipped, 0);
    assert_eq!(stats.triangles_backface_culled, 0);
    assert_eq!(stats.triangles_queued, 1);
    assert_eq!(stats.tile_failures, 0);
    assert_eq!(renderer.queue()[0].light, [1.0; 3]);

    let fb = renderer.framebuffer();
    let mut covered_rows = 0;
    for y in 0..fb.height {
        let lit: Vec<usize> = (0..fb.width)
            .filter(|&x| fb.pixel(x, y) != Some(DEFAULT_CLEAR_COLOR))
            .collect();
        let (Some(&first), Some(&last)) = (lit.first(), lit.last()) else {
            continue;
        };
        covered_rows += 1;

        assert_eq!(lit.len(), last - first + 1, "row {y} has a gap");
        assert!(lit.iter().all(|&x| fb.pixel(x, y) == Some(0xFFFFFF)));
        let center = (first + last + 1) as f32 * 0.5;
        assert!((center - 50.0).abs() <= 0.5, "row {y} centered at {center}");
    }
    // Apex row is zero width.
    assert_eq!(covered_rows, 19);
}

#[test]
fn view_axis_projects_to_screen_center() {
    let position = Vec3::new(3.0, -2.0, 7.0);
    let camera = CameraPose::new(position);

    for d in [0.5, 5.0, 100.0, 900.0] {
        let mut p = pipeline(160, 90);
        let mut stats = FrameStats::default();
        let tri = Triangle::new(
            position + Vec3::new(0.0, 0.0, d),
            position + Vec3::new(0.1, 0.0, d),
            position + Vec3::new(0.0, 0.1, d),
            1,
        );
        p.submit_mesh(&Mesh::new(vec![tri]), &camera, &mut stats);
        assert_eq!(stats.triangles_queued, 1, "d = {d}");
        assert_eq!(p.queue()[0].points[0], IVec2::new(80, 45), "d = {d}");
    }
}

#[test]
fn reversing_winding_flips_the_cull_decision() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let camera = CameraPose::default();
    let mut checked = 0;

    for _ in 0..1000 {
        // Inside the 90 degree view volume, so the mesh is never frustum culled.
        let mut point = || {
            let z = rng.gen_range(1.0..20.0);
            Vec3::new(rng.gen_range(-0.9..0.9) * z, rng.gen_range(-0.9..0.9) * z, z)
        };
        let tri = Triangle::new(point(), point(), point(), 1);
        let normal = tri.face_normal();
        if normal == Vec3::ZERO || normal.dot(tri.positions[0]).abs() < 1e-2 {
            continue;
        }

        let mut p = pipeline(64, 64);
        let mut front = FrameStats::default();
        p.submit_mesh(&Mesh::new(vec![tri]), &camera, &mut front);
        let mut back = FrameStats::default();
        p.submit_mesh(&Mesh::new(vec![tri.flipped()]), &camera, &mut back);

        assert_eq!(
            front.triangles_queued + back.triangles_queued,
            1,
            "exactly one winding must survive"
        );
        assert_eq!(front.triangles_backface_culled + back.triangles_backface_culled, 1);
        checked += 1;
    }
    assert!(checked > 500);
}

#[test]
fn nearer_mesh_wins_in_either_submission_order() {
    let near = Mesh::new(vec![reference_triangle(0xFF0000, 4.0)]);
    let far = Mesh::new(vec![reference_triangle(0x0000FF, 6.0)]);
    let camera = CameraPose::default();

    let mut a = renderer(80, 60, 3);
    a.render_frame([&near, &far], &camera);
    let mut b = renderer(80, 60, 3);
    b.render_frame([&far, &near], &camera);

    assert_eq!(a.framebuffer().color_buffer, b.framebuffer().color_buffer);
    assert_eq!(a.framebuffer().pixel(40, 30), Some(shade_color(0xFF0000, 1.0)));
}

#[test]
fn mesh_outside_frustum_draws_nothing() {
    let mut renderer = renderer(64, 48, 2);
    let mut camera = CameraPose::default();
    camera.rotate(0.0, std::f32::consts::PI);
    let mesh = Mesh::new(vec![reference_triangle(0xFF0000, 5.0)]);

    let stats = renderer.render_frame([&mesh], &camera);
    assert_eq!(stats.meshes_culled, 1);
    assert_eq!(stats.triangles_tested, 0);
    assert!(renderer
        .framebuffer()
        .color_buffer
        .iter()
        .all(|&c| c == DEFAULT_CLEAR_COLOR));
}

#[test]
fn camera_inside_geometry_clips_without_panicking() {
    let mut renderer = renderer(64, 48, 4);
    // Large triangle straddling the camera.
    let mesh = Mesh::new(vec![Triangle::new(
        Vec3::new(-50.0, -1.0, -50.0),
        Vec3::new(50.0, -1.0, -50.0),
        Vec3::new(0.0, -1.0, 50.0),
        0x00FF00,
    )]);
    let stats = renderer.render_frame([&mesh], &CameraPose::default());
    assert_eq!(stats.tile_failures, 0);
    assert!(stats.triangles_queued >= 1);
    assert!(renderer
        .framebuffer()
        .color_buffer
        .iter()
        .any(|&c| c != DEFAULT_CLEAR_COLOR));
}
