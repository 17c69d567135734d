/// Basic, configurable shading utilities.
/// Kept separate from the pipeline so lighting models
/// can evolve independently of geometry processing.
use glam::Vec3;

/// How lighting is evaluated per triangle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShadingMode {
    /// One intensity from the face normal, shared by all three vertices.
    Flat,
    /// Per-vertex intensities from the vertex normals, interpolated across
    /// the triangle. Triangles without vertex normals fall back to flat.
    #[default]
    Gouraud,
}

impl ShadingMode {
    pub fn toggled(self) -> Self {
        match self {
            ShadingMode::Flat => ShadingMode::Gouraud,
            ShadingMode::Gouraud => ShadingMode::Flat,
        }
    }
}

/// Single directional "sun" plus an ambient floor.
#[derive(Copy, Clone, Debug)]
pub struct ShadingConfig {
    /// World-space direction pointing towards the sun.
    pub sun_direction: Vec3,
    /// Minimum intensity, so unlit faces are never pure black.
    pub ambient: f32,
    /// Exponent applied to the final intensity for extra contrast.
    /// 1.0 leaves the Lambert term untouched.
    pub contrast_exponent: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            // Above and slightly behind the default view direction.
            sun_direction: Vec3::new(0.3, 1.0, -0.4).normalize(),
            ambient: 0.2,
            contrast_exponent: 1.2,
        }
    }
}

impl ShadingConfig {
    /// Intensity in [0, 1] for a unit normal and a unit direction towards
    /// the light, both in the same space.
    #[inline]
    pub fn intensity(&self, normal: Vec3, to_light: Vec3) -> f32 {
        let lambert = normal.dot(to_light).max(0.0);
        let light = self.ambient + (1.0 - self.ambient) * lambert;
        light.clamp(0.0, 1.0).powf(self.contrast_exponent)
    }
}

/// Scale each channel of a 0xRRGGBB color by `light`, clamping to [0, 255].
#[inline]
pub fn shade_color(base: u32, light: f32) -> u32 {
    // Unpack
    let r = (base >> 16) & 0xFF;
    let g = (base >> 8) & 0xFF;
    let b = base & 0xFF;

    // 8.8 fixed point; light = 1.0 maps to 256 so full intensity is lossless.
    let light_fp = (light.clamp(0.0, 1.0) * 256.0) as u32;

    let r_lit = ((r * light_fp) >> 8).min(255);
    let g_lit = ((g * light_fp) >> 8).min(255);
    let b_lit = ((b * light_fp) >> 8).min(255);

    (r_lit << 16) | (g_lit << 8) | b_lit
}

/// Pack 8-bit channels into 0xRRGGBB.
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}
