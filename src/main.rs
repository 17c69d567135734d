/// Demo application entry point
/// Handles window creation, input, and the render loop
use glam::Vec3;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use raster_engine::rendering::scaled_size;
use raster_engine::scene::load_obj;
use raster_engine::*;
use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

/// Fraction of the window resolution the scene is rendered at.
const DEFAULT_RENDER_SCALE: f32 = 0.5;
/// Camera height above the ground in walking mode.
const EYE_HEIGHT: f32 = 2.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== Raster Engine - Software Rasterizer ===");
    log::info!("Controls:");
    log::info!("  WASD - Move camera, Shift - Sprint");
    log::info!("  Space/Ctrl - Up/Down");
    log::info!("  Mouse - Look around (click to capture)");
    log::info!("  G - Toggle walking mode, F - Toggle flat/Gouraud shading");
    log::info!("  ESC - Release mouse / Exit");

    let render_scale = match std::env::var("RASTER_SCALE") {
        Ok(value) => value.parse::<f32>()?,
        Err(_) => DEFAULT_RENDER_SCALE,
    };

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Raster Engine")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    // Initialize software presentation context
    let context = softbuffer::Context::new(window.clone())?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())?;

    let window_size = window.inner_size();
    let config = RendererConfig::for_display(
        window_size.width as usize,
        window_size.height as usize,
        render_scale,
    )?;
    let mut renderer = Renderer::new(config)?;

    // Scene: terrain chunks plus an optional model from the command line
    let terrain_start = Instant::now();
    let terrain = Terrain::generate(TerrainConfig::default());
    let mut meshes = terrain.chunks.clone();
    log::info!(
        "Terrain generation: {}ms ({} chunks, {} triangles)",
        terrain_start.elapsed().as_millis(),
        terrain.chunks.len(),
        terrain.triangle_count()
    );
    if let Some(path) = std::env::args().nth(1) {
        let mut model = load_obj(&path)?;
        let ground = terrain.height_at(0.0, 20.0);
        model.translate(Vec3::new(0.0, ground + 3.0, 20.0));
        meshes.push(model);
    }

    let mut camera = CameraPose::new(Vec3::new(0.0, 15.0, -40.0));
    camera.rotate(0.3, 0.0);
    let mut camera_controller = CameraController::new();
    let mut walking = false;

    // Timing
    let mut last_frame = Instant::now();
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();

    let mut mouse_captured = false;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    let resized = scaled_size(
                        new_size.width as usize,
                        new_size.height as usize,
                        render_scale,
                    )
                    .and_then(|(w, h)| renderer.resize(w, h));
                    if let Err(err) = resized {
                        log::warn!("Ignoring resize to {:?}: {}", new_size, err);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let pressed = event.state == ElementState::Pressed;

                    if let PhysicalKey::Code(keycode) = event.physical_key {
                        match keycode {
                            KeyCode::KeyW => camera_controller.forward_pressed = pressed,
                            KeyCode::KeyS => camera_controller.backward_pressed = pressed,
                            KeyCode::KeyA => camera_controller.left_pressed = pressed,
                            KeyCode::KeyD => camera_controller.right_pressed = pressed,
                            KeyCode::Space => camera_controller.up_pressed = pressed,
                            KeyCode::ControlLeft => camera_controller.down_pressed = pressed,
                            KeyCode::ShiftLeft => camera_controller.sprint_pressed = pressed,
                            KeyCode::KeyF if pressed && !event.repeat => {
                                let mode = renderer.shading_mode().toggled();
                                renderer.set_shading_mode(mode);
                                log::info!("Shading: {:?}", mode);
                            }
                            KeyCode::KeyG if pressed && !event.repeat => {
                                walking = !walking;
                                log::info!("Walking mode: {}", if walking { "ON" } else { "OFF" });
                            }
                            KeyCode::Escape if pressed => {
                                if mouse_captured {
                                    mouse_captured = false;
                                    release_cursor(&window);
                                } else {
                                    elwt.exit();
                                }
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if button == MouseButton::Left && state == ElementState::Pressed {
                        mouse_captured = capture_cursor(&window);
                    }
                }
                WindowEvent::RedrawRequested => {
                    // Calculate delta time
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32();
                    last_frame = now;

                    camera_controller.update_camera(&mut camera, dt);
                    if walking {
                        camera.position.y =
                            terrain.height_at(camera.position.x, camera.position.z) + EYE_HEIGHT;
                    }

                    let stats = renderer.render_frame(&meshes, &camera);

                    if let Err(err) = present(&mut surface, &window, renderer.framebuffer()) {
                        log::error!("Present failed: {}", err);
                        elwt.exit();
                        return;
                    }

                    // FPS counter with additional stats
                    frame_count += 1;
                    if fps_timer.elapsed().as_secs() >= 1 {
                        log::info!(
                            "FPS: {} | Meshes: {}/{} | Triangles: {} | Tiles: {}",
                            frame_count,
                            stats.meshes_submitted - stats.meshes_culled,
                            stats.meshes_submitted,
                            stats.triangles_queued,
                            stats.tiles_rasterized
                        );
                        frame_count = 0;
                        fps_timer = Instant::now();
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                if mouse_captured {
                    camera_controller.apply_mouse(&mut camera, delta.0 as f32, delta.1 as f32);
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                #[cfg(feature = "profiling")]
                FUNCTION_COUNTERS.snapshot().log_report();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn capture_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(err) = grabbed {
        log::warn!("Cursor grab unavailable: {}", err);
    }
    window.set_cursor_visible(false);
    true
}

fn release_cursor(window: &Window) {
    let _ = window.set_cursor_grab(CursorGrabMode::None);
    window.set_cursor_visible(true);
}

/// Stretch the internal framebuffer onto the window surface.
fn present(
    surface: &mut softbuffer::Surface<Arc<Window>, Arc<Window>>,
    window: &Window,
    framebuffer: &Framebuffer,
) -> Result<(), softbuffer::SoftBufferError> {
    let size = window.inner_size();
    let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
    else {
        // Minimized
        return Ok(());
    };

    surface.resize(width, height)?;
    let mut buffer = surface.buffer_mut()?;
    framebuffer.blit_scaled(&mut buffer, size.width as usize, size.height as usize);
    buffer.present()
}
