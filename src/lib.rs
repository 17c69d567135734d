pub mod camera;
pub mod error;
pub mod math;
pub mod perf;
/// Raster Engine - multi-threaded software triangle rasterizer
/// Serial geometry phase feeding a tile-parallel scanline raster phase
pub mod rendering;
pub mod scene;

pub use camera::{CameraController, CameraPose, Frustum, MAX_PITCH};
pub use error::RenderError;
pub use math::{Plane, Vector3};
pub use perf::{CounterSnapshot, FunctionCounters, PerfTimer, FUNCTION_COUNTERS};
pub use rendering::{
    FrameStats, Framebuffer, ProjectedTriangle, Renderer, RendererConfig, ShadingConfig,
    ShadingMode,
};
pub use scene::{BoundingSphere, Mesh, Terrain, TerrainConfig, Triangle};
