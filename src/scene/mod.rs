/// Scene data fed to the renderer: triangle meshes and the collaborators
/// that produce them (OBJ files and procedural terrain).
pub mod mesh;
pub mod obj;
pub mod terrain;

pub use mesh::{BoundingSphere, Mesh, Triangle, DEFAULT_COLOR};
pub use obj::{load_obj, parse_obj, ObjError};
pub use terrain::{Terrain, TerrainConfig};
