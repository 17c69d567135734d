/// Frame driver tying the geometry phase to the tile-parallel raster phase.
///
/// A frame is `begin_frame`, any number of `submit_mesh` calls, then
/// `end_frame`. The render queue is only appended to between `begin_frame`
/// and `end_frame`; the raster phase borrows it read-only.
use super::framebuffer::Framebuffer;
use super::pipeline::{FrameStats, GeometryPipeline};
use super::rasterizer::ProjectedTriangle;
use super::scheduler::TileScheduler;
use super::shading::{rgb, ShadingConfig, ShadingMode};
use crate::camera::CameraPose;
use crate::count_call;
use crate::error::RenderError;
use crate::perf::{PerfTimer, PhaseTimings};
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use crate::scene::Mesh;
use std::time::{Duration, Instant};

/// Raster phases slower than this are logged as warnings.
const SLOW_RASTER: Duration = Duration::from_millis(16);

/// Light sky blue.
pub const DEFAULT_CLEAR_COLOR: u32 = rgb(0x87, 0xCE, 0xEB);

/// Renderer configuration, fixed at construction apart from `resize`.
#[derive(Copy, Clone, Debug)]
pub struct RendererConfig {
    /// Internal render resolution.
    pub width: usize,
    pub height: usize,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Edge length of the square raster tiles, in pixels.
    pub tile_size: usize,
    /// `None` uses the host's available parallelism.
    pub worker_threads: Option<usize>,
    pub clear_color: u32,
    pub shading: ShadingConfig,
    pub shading_mode: ShadingMode,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            fov_degrees: 90.0,
            near: 0.1,
            far: 1000.0,
            tile_size: 64,
            worker_threads: None,
            clear_color: DEFAULT_CLEAR_COLOR,
            shading: ShadingConfig::default(),
            shading_mode: ShadingMode::default(),
        }
    }
}

impl RendererConfig {
    /// Default config rendering at `scale` times the display size
    /// (each dimension at least 1 pixel).
    pub fn for_display(display_width: usize, display_height: usize, scale: f32) -> Result<Self, RenderError> {
        let (width, height) = scaled_size(display_width, display_height, scale)?;
        Ok(Self {
            width,
            height,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyFramebuffer {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.near > 0.0 && self.near < self.far && self.far.is_finite()) {
            return Err(RenderError::InvalidClipRange {
                near: self.near,
                far: self.far,
            });
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(RenderError::InvalidFieldOfView(self.fov_degrees));
        }
        if self.tile_size == 0 {
            return Err(RenderError::InvalidTileSize);
        }
        if self.worker_threads == Some(0) {
            return Err(RenderError::InvalidWorkerCount);
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Internal resolution for a display size and render scale in (0, 1].
pub fn scaled_size(display_width: usize, display_height: usize, scale: f32) -> Result<(usize, usize), RenderError> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(RenderError::InvalidRenderScale(scale));
    }
    let scale_dim = |d: usize| ((d as f32 * scale) as usize).max(1);
    Ok((scale_dim(display_width), scale_dim(display_height)))
}

pub struct Renderer {
    config: RendererConfig,
    framebuffer: Framebuffer,
    pipeline: GeometryPipeline,
    scheduler: TileScheduler,
    stats: FrameStats,
    timings: PhaseTimings,
    frame_start: Instant,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        config.validate()?;

        let workers = config.worker_count();
        let scheduler = TileScheduler::new(workers, config.tile_size)?;
        let framebuffer = Framebuffer::new(config.width, config.height);
        let pipeline = GeometryPipeline::new(
            config.width,
            config.height,
            config.fov_degrees,
            config.near,
            config.far,
            config.shading,
            config.shading_mode,
        );

        let grid = scheduler.grid_for(&framebuffer);
        log::info!(
            "Renderer {}x{} | fov {}° | {}x{} tiles of {}px | {} workers",
            config.width,
            config.height,
            config.fov_degrees,
            grid.cols(),
            grid.rows(),
            config.tile_size,
            scheduler.worker_count()
        );

        Ok(Self {
            config,
            framebuffer,
            pipeline,
            scheduler,
            stats: FrameStats::default(),
            timings: PhaseTimings::default(),
            frame_start: Instant::now(),
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Triangles queued so far this frame.
    #[inline]
    pub fn queue(&self) -> &[ProjectedTriangle] {
        self.pipeline.queue()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.scheduler.worker_count()
    }

    pub fn shading_mode(&self) -> ShadingMode {
        self.pipeline.shading_mode
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.config.shading_mode = mode;
        self.pipeline.shading_mode = mode;
    }

    pub fn set_shading(&mut self, shading: ShadingConfig) {
        self.config.shading = shading;
        self.pipeline.shading = shading;
    }

    /// Clear to the sky color, reset depth, empty the queue and the stats.
    pub fn begin_frame(&mut self) {
        let start = Instant::now();
        self.frame_start = start;
        self.framebuffer.clear(self.config.clear_color);
        count_call!(FUNCTION_COUNTERS.framebuffer_clear_calls);
        self.pipeline.clear_queue();
        self.stats = FrameStats::default();
        self.timings = PhaseTimings {
            clear_us: start.elapsed().as_secs_f64() * 1e6,
            ..PhaseTimings::default()
        };
    }

    /// Geometry phase for one mesh. Returns false if it was frustum culled.
    pub fn submit_mesh(&mut self, mesh: &Mesh, camera: &CameraPose) -> bool {
        self.pipeline.submit_mesh(mesh, camera, &mut self.stats)
    }

    /// Raster phase: blocks until every tile has been drawn.
    pub fn end_frame(&mut self) -> FrameStats {
        let geometry_end = Instant::now();
        self.timings.geometry_us = geometry_end.duration_since(self.frame_start).as_secs_f64() * 1e6
            - self.timings.clear_us;

        let report = {
            let _timer = PerfTimer::new("raster phase");
            self.scheduler.rasterize(self.pipeline.queue(), &mut self.framebuffer)
        };
        let raster_time = geometry_end.elapsed();
        self.timings.raster_us = raster_time.as_secs_f64() * 1e6;

        self.stats.tiles_rasterized = report.tiles_rasterized;
        self.stats.tile_failures = report.tile_failures;

        if raster_time > SLOW_RASTER {
            log::warn!(
                "Slow raster phase: {:.2}ms for {} triangles",
                raster_time.as_secs_f64() * 1e3,
                self.stats.triangles_queued
            );
        }
        log::debug!("{:?}", self.stats);
        self.timings.log_summary();

        self.stats
    }

    /// One whole frame: begin, submit every mesh, end.
    pub fn render_frame<'a, I>(&mut self, meshes: I, camera: &CameraPose) -> FrameStats
    where
        I: IntoIterator<Item = &'a Mesh>,
    {
        self.begin_frame();
        for mesh in meshes {
            self.submit_mesh(mesh, camera);
        }
        self.end_frame()
    }

    /// Change the internal resolution; rebuilds both buffers and the projection.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyFramebuffer { width, height });
        }
        if width == self.config.width && height == self.config.height {
            return Ok(());
        }

        self.config.width = width;
        self.config.height = height;
        self.framebuffer.resize(width, height);
        self.framebuffer.clear(self.config.clear_color);
        self.pipeline.set_viewport(
            width,
            height,
            self.config.fov_degrees,
            self.config.near,
            self.config.far,
        );
        log::info!("Renderer resized to {}x{}", width, height);
        Ok(())
    }
}
