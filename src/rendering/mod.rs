/// Software rasterization pipeline
/// Geometry runs serially into a render queue; tiles are rasterized in parallel
pub mod clipper;
pub mod framebuffer;
pub mod pipeline;
pub mod rasterizer;
pub mod renderer;
pub mod scheduler;
pub mod shading;

pub use clipper::{clip_triangle, ClippedTriangles};
pub use framebuffer::{FrameTile, Framebuffer, SharedFramebuffer, TileRect};
pub use pipeline::{FrameStats, GeometryPipeline};
pub use rasterizer::{fill_triangle, rasterize_queue, PixelTarget, ProjectedTriangle};
pub use renderer::{scaled_size, Renderer, RendererConfig, DEFAULT_CLEAR_COLOR};
pub use scheduler::{TileGrid, TileReport, TileScheduler};
pub use shading::{rgb, shade_color, ShadingConfig, ShadingMode};
