/// Error types for renderer construction and reconfiguration
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("framebuffer must have a non-zero size, got {width}x{height}")]
    EmptyFramebuffer { width: usize, height: usize },

    #[error("invalid clip range: near {near} must be positive and less than far {far}")]
    InvalidClipRange { near: f32, far: f32 },

    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("tile size must be non-zero")]
    InvalidTileSize,

    #[error("worker count must be non-zero")]
    InvalidWorkerCount,

    #[error("render scale must be in (0, 1], got {0}")]
    InvalidRenderScale(f32),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
