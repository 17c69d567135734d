/// Procedural heightfield terrain split into chunk meshes.
/// Each chunk carries its own bounding sphere so the renderer can skip
/// chunks outside the frustum.
use super::mesh::{Mesh, Triangle};
use glam::Vec3;
use noise::{NoiseFn, Perlin};

const WATER_COLOR: u32 = 0x2E8B57;
const EARTH_COLOR: u32 = 0x8B4513;
const SNOW_COLOR: u32 = 0xFFFFFF;

/// Terrain generation parameters.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// Grid cells along x.
    pub width: usize,
    /// Grid cells along z.
    pub depth: usize,
    /// World units per grid cell.
    pub scale: f32,
    /// Grid cells per chunk edge.
    pub chunk_size: usize,
    pub noise_frequency: f64,
    pub height_amplitude: f32,
    pub seed: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 100,
            depth: 100,
            scale: 2.0,
            chunk_size: 10,
            noise_frequency: 0.1,
            height_amplitude: 10.0,
            seed: 1,
        }
    }
}

/// Terrain meshes plus the height function used to build them.
pub struct Terrain {
    pub chunks: Vec<Mesh>,
    config: TerrainConfig,
    perlin: Perlin,
}

impl Terrain {
    pub fn generate(config: TerrainConfig) -> Self {
        let perlin = Perlin::new(config.seed);
        let mut terrain = Self {
            chunks: Vec::new(),
            config,
            perlin,
        };
        terrain.chunks = terrain.build_chunks();
        terrain
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn triangle_count(&self) -> usize {
        self.chunks.iter().map(Mesh::len).sum()
    }

    /// Height at fractional grid coordinates.
    #[inline]
    fn grid_height(&self, gx: f64, gz: f64) -> f32 {
        let freq = self.config.noise_frequency;
        let noise_value = self.perlin.get([gx * freq, gz * freq]);
        noise_value as f32 * self.config.height_amplitude
    }

    fn grid_to_world(&self, gx: f64, gz: f64) -> (f32, f32) {
        let half_w = self.config.width as f64 * 0.5;
        let half_d = self.config.depth as f64 * 0.5;
        let scale = self.config.scale as f64;
        (((gx - half_w) * scale) as f32, ((gz - half_d) * scale) as f32)
    }

    /// Ground height at a world-space (x, z), following the same surface
    /// the meshes were sampled from.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        let scale = self.config.scale as f64;
        let gx = world_x as f64 / scale + self.config.width as f64 * 0.5;
        let gz = world_z as f64 / scale + self.config.depth as f64 * 0.5;
        self.grid_height(gx, gz)
    }

    fn vertex(&self, gx: usize, gz: usize) -> Vec3 {
        let (x, z) = self.grid_to_world(gx as f64, gz as f64);
        Vec3::new(x, self.grid_height(gx as f64, gz as f64), z)
    }

    /// Smooth normal from central differences of the height function.
    fn vertex_normal(&self, gx: usize, gz: usize) -> Vec3 {
        let (gx, gz) = (gx as f64, gz as f64);
        let two_cells = 2.0 * self.config.scale;
        let dh_dx = (self.grid_height(gx + 1.0, gz) - self.grid_height(gx - 1.0, gz)) / two_cells;
        let dh_dz = (self.grid_height(gx, gz + 1.0) - self.grid_height(gx, gz - 1.0)) / two_cells;
        Vec3::new(-dh_dx, 1.0, -dh_dz).normalize()
    }

    fn band_color(height: f32) -> u32 {
        if height < 0.0 {
            WATER_COLOR
        } else if height < 4.0 {
            EARTH_COLOR
        } else {
            SNOW_COLOR
        }
    }

    fn build_chunks(&self) -> Vec<Mesh> {
        let TerrainConfig {
            width,
            depth,
            chunk_size,
            ..
        } = self.config;
        let chunk_size = chunk_size.max(1);

        let mut chunks = Vec::new();
        for start_x in (0..width).step_by(chunk_size) {
            for start_z in (0..depth).step_by(chunk_size) {
                let end_x = (start_x + chunk_size).min(width);
                let end_z = (start_z + chunk_size).min(depth);

                let mut triangles = Vec::with_capacity((end_x - start_x) * (end_z - start_z) * 2);
                for x in start_x..end_x {
                    for z in start_z..end_z {
                        let p00 = self.vertex(x, z);
                        let p10 = self.vertex(x + 1, z);
                        let p01 = self.vertex(x, z + 1);
                        let p11 = self.vertex(x + 1, z + 1);

                        let n00 = self.vertex_normal(x, z);
                        let n10 = self.vertex_normal(x + 1, z);
                        let n01 = self.vertex_normal(x, z + 1);
                        let n11 = self.vertex_normal(x + 1, z + 1);

                        let color = Self::band_color(p00.y);

                        // Both halves face +y (up) under the renderer's winding rule.
                        triangles.push(Triangle::new(p00, p11, p01, color).with_normals([n00, n11, n01]));
                        triangles.push(Triangle::new(p00, p10, p11, color).with_normals([n00, n10, n11]));
                    }
                }
                chunks.push(Mesh::new(triangles));
            }
        }
        chunks
    }
}
