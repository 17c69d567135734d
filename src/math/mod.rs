/// Geometry kernel shared by the pipeline stages.
/// Vectors are plain `glam::Vec3` values; this module adds the matrix
/// builders and plane math the renderer needs on top of glam.
pub mod matrix;
pub mod plane;

pub use matrix::{perspective_projection, rotation, transform_point, translation, Axis};
pub use plane::Plane;

/// Vector type used throughout the crate.
pub type Vector3 = glam::Vec3;
