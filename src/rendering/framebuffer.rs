/// Framebuffer for software rendering
/// Stores color and depth information
///
/// Memory layout:
/// - Hot metadata (width, height) stored first for bounds checking
/// - Color and depth are separate Vecs so clears and blits touch one buffer at a time
use std::marker::PhantomData;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)` in framebuffer coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl TileRect {
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

pub struct Framebuffer {
    // Hot data: used for every bounds check and index calculation
    pub width: usize,
    pub height: usize,
    pub color_buffer: Vec<u32>, // 0xRRGGBB
    pub depth_buffer: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_count = width * height;
        Self {
            width,
            height,
            color_buffer: vec![0; pixel_count],
            depth_buffer: vec![f32::INFINITY; pixel_count],
        }
    }

    /// Fill color with `clear_color` and reset depth to +inf.
    pub fn clear(&mut self, clear_color: u32) {
        self.color_buffer.fill(clear_color);
        self.depth_buffer.fill(f32::INFINITY);
    }

    #[inline]
    pub fn rect(&self) -> TileRect {
        TileRect::new(0, 0, self.width, self.height)
    }

    /// Set pixel with depth test. Returns true if the pixel was written.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32, depth: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        let index = y * self.width + x;

        if depth < self.depth_buffer[index] {
            self.color_buffer[index] = color;
            self.depth_buffer[index] = depth;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.color_buffer[y * self.width + x])
    }

    #[inline]
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth_buffer[y * self.width + x])
    }

    /// Get color buffer as slice
    pub fn color_buffer_slice(&self) -> &[u32] {
        &self.color_buffer
    }

    /// Resize framebuffer. Contents are undefined until the next clear.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let pixel_count = width * height;
        self.color_buffer.resize(pixel_count, 0);
        self.depth_buffer.resize(pixel_count, f32::INFINITY);
    }

    /// Nearest-neighbour stretch of the color buffer into `dst`
    /// (`dst_width * dst_height` pixels), e.g. for presenting a reduced
    /// internal resolution on a full-size window.
    pub fn blit_scaled(&self, dst: &mut [u32], dst_width: usize, dst_height: usize) {
        if self.width == 0 || self.height == 0 || dst_width == 0 {
            return;
        }
        for (dy, row) in dst.chunks_exact_mut(dst_width).take(dst_height).enumerate() {
            let sy = dy * self.height / dst_height;
            let src_row = &self.color_buffer[sy * self.width..(sy + 1) * self.width];
            for (dx, out) in row.iter_mut().enumerate() {
                *out = src_row[dx * self.width / dst_width];
            }
        }
    }
}

/// Shared handle to a framebuffer's pixels that hands out disjoint tiles to
/// worker threads. Holds the exclusive borrow for its whole lifetime, so the
/// framebuffer cannot be touched through any other path meanwhile.
pub struct SharedFramebuffer<'a> {
    width: usize,
    height: usize,
    color_ptr: *mut u32,
    depth_ptr: *mut f32,
    _borrow: PhantomData<&'a mut Framebuffer>,
}

// Safety: the pointers come from an exclusive borrow, and `tile` requires
// callers to keep concurrently live tiles disjoint.
unsafe impl Send for SharedFramebuffer<'_> {}
unsafe impl Sync for SharedFramebuffer<'_> {}

impl<'a> SharedFramebuffer<'a> {
    pub fn new(framebuffer: &'a mut Framebuffer) -> Self {
        Self {
            width: framebuffer.width,
            height: framebuffer.height,
            color_ptr: framebuffer.color_buffer.as_mut_ptr(),
            depth_ptr: framebuffer.depth_buffer.as_mut_ptr(),
            _borrow: PhantomData,
        }
    }

    /// Mutable view of one rectangle; the rect is clipped to the buffer.
    ///
    /// # Safety
    /// No two tiles alive at the same time may overlap.
    pub unsafe fn tile(&self, rect: TileRect) -> FrameTile<'_> {
        let rect = TileRect::new(
            rect.x0.min(self.width),
            rect.y0.min(self.height),
            rect.x1.min(self.width),
            rect.y1.min(self.height),
        );
        FrameTile {
            width: self.width,
            rect,
            color_ptr: self.color_ptr,
            depth_ptr: self.depth_ptr,
            _borrow: PhantomData,
        }
    }
}

/// View into a rectangular tile of the framebuffer.
/// Every access is checked against the tile rectangle, so a tile can only
/// ever read or write its own pixels.
pub struct FrameTile<'a> {
    width: usize,
    rect: TileRect,
    color_ptr: *mut u32,
    depth_ptr: *mut f32,
    _borrow: PhantomData<&'a mut [u32]>,
}

impl FrameTile<'_> {
    #[inline]
    pub fn rect(&self) -> TileRect {
        self.rect
    }

    /// Depth test at global pixel (x, y). If it lies in this tile and is
    /// strictly closer than the stored depth, store it and return the
    /// buffer index for the color write.
    #[inline]
    pub fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }

        let index = y * self.width + x;
        // Safety: (x, y) is inside this tile, which lies inside the buffer
        // and is not shared with any other live tile.
        let depth_ref = unsafe { &mut *self.depth_ptr.add(index) };
        if depth < *depth_ref {
            *depth_ref = depth;
            Some(index)
        } else {
            None
        }
    }

    /// Write a color at an index returned by `test_depth_and_get_index`.
    #[inline]
    pub fn write_color(&mut self, index: usize, color: u32) {
        let (x, y) = (index % self.width, index / self.width);
        if self.rect.contains(x, y) {
            // Safety: index lies inside this tile (checked above).
            unsafe {
                *self.color_ptr.add(index) = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_depth_and_color() {
        let mut fb = Framebuffer::new(4, 3);
        assert!(fb.set_pixel(1, 1, 0x123456, 0.5));
        fb.clear(0x87CEEB);
        assert!(fb.color_buffer.iter().all(|&c| c == 0x87CEEB));
        assert!(fb.depth_buffer.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn set_pixel_requires_strictly_closer_depth() {
        let mut fb = Framebuffer::new(2, 2);
        assert!(fb.set_pixel(0, 0, 1, 0.5));
        assert!(!fb.set_pixel(0, 0, 2, 0.5));
        assert!(fb.set_pixel(0, 0, 3, 0.25));
        assert_eq!(fb.pixel(0, 0), Some(3));
        assert!(!fb.set_pixel(5, 0, 4, 0.0));
    }

    #[test]
    fn tile_writes_stay_inside_rect() {
        let mut fb = Framebuffer::new(8, 8);
        {
            let shared = SharedFramebuffer::new(&mut fb);
            let mut tile = unsafe { shared.tile(TileRect::new(4, 4, 8, 8)) };
            assert!(tile.test_depth_and_get_index(1, 1, 0.1).is_none());
            let idx = tile.test_depth_and_get_index(5, 6, 0.1).unwrap();
            tile.write_color(idx, 0xABCDEF);
            // Index outside the tile is ignored.
            tile.write_color(0, 0xFFFFFF);
        }
        assert_eq!(fb.pixel(5, 6), Some(0xABCDEF));
        assert_eq!(fb.pixel(0, 0), Some(0));
        assert_eq!(fb.depth(5, 6), Some(0.1));
    }

    #[test]
    fn tile_rect_is_clipped_to_buffer() {
        let mut fb = Framebuffer::new(10, 6);
        let shared = SharedFramebuffer::new(&mut fb);
        let tile = unsafe { shared.tile(TileRect::new(8, 4, 16, 12)) };
        assert_eq!(tile.rect(), TileRect::new(8, 4, 10, 6));
    }

    #[test]
    fn blit_scaled_doubles_pixels() {
        let mut fb = Framebuffer::new(2, 1);
        fb.color_buffer.copy_from_slice(&[1, 2]);
        let mut dst = vec![0u32; 4 * 2];
        fb.blit_scaled(&mut dst, 4, 2);
        assert_eq!(dst, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }
}
