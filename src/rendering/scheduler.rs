/// Tile-parallel raster dispatch
///
/// The framebuffer is cut into square tiles. A persistent rayon pool runs one
/// claim loop per worker: each worker pulls the next tile index from a shared
/// atomic counter and rasterizes the whole render queue clipped to that tile,
/// so a worker that lands on a sparse tile immediately moves on to the next.
use super::framebuffer::{FrameTile, Framebuffer, SharedFramebuffer, TileRect};
use super::rasterizer::{rasterize_queue, ProjectedTriangle};
use crate::count_call;
use crate::error::RenderError;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Non-overlapping square tiles covering a `width x height` buffer, row-major.
/// Tiles in the last column and row are clipped to the buffer edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: usize,
    cols: usize,
    rows: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            cols: width.div_ceil(tile_size),
            rows: height.div_ceil(tile_size),
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Pixel bounds of tile `index`, or `None` past the last tile.
    pub fn rect(&self, index: usize) -> Option<TileRect> {
        if index >= self.len() {
            return None;
        }
        let x0 = (index % self.cols) * self.tile_size;
        let y0 = (index / self.cols) * self.tile_size;
        Some(TileRect::new(
            x0,
            y0,
            (x0 + self.tile_size).min(self.width),
            (y0 + self.tile_size).min(self.height),
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.len()).filter_map(move |i| self.rect(i))
    }
}

/// Outcome of one raster phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileReport {
    pub tiles_rasterized: usize,
    pub tile_failures: usize,
}

pub struct TileScheduler {
    pool: ThreadPool,
    tile_size: usize,
}

impl TileScheduler {
    /// Start `worker_count` workers. They live until the scheduler is dropped.
    pub fn new(worker_count: usize, tile_size: usize) -> Result<Self, RenderError> {
        if worker_count == 0 {
            return Err(RenderError::InvalidWorkerCount);
        }
        if tile_size == 0 {
            return Err(RenderError::InvalidTileSize);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("raster-worker-{i}"))
            .build()?;

        log::debug!("Started {} raster workers, tile size {}px", worker_count, tile_size);
        Ok(Self { pool, tile_size })
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[inline]
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn grid_for(&self, framebuffer: &Framebuffer) -> TileGrid {
        TileGrid::new(framebuffer.width, framebuffer.height, self.tile_size)
    }

    /// Rasterize the frozen `queue` into `framebuffer`. Returns once every
    /// tile has been claimed and every worker has left its claim loop.
    pub fn rasterize(&self, queue: &[ProjectedTriangle], framebuffer: &mut Framebuffer) -> TileReport {
        if queue.is_empty() {
            return TileReport::default();
        }
        self.for_each_tile(framebuffer, |tile| rasterize_queue(queue, tile))
    }

    /// Run `draw` once per tile on the worker pool. A panic inside `draw`
    /// only loses that tile: it is counted, logged, and the frame carries on.
    pub(crate) fn for_each_tile<F>(&self, framebuffer: &mut Framebuffer, draw: F) -> TileReport
    where
        F: Fn(&mut FrameTile<'_>) + Sync,
    {
        let grid = self.grid_for(framebuffer);
        if grid.is_empty() {
            return TileReport::default();
        }

        let shared = SharedFramebuffer::new(framebuffer);
        let next_tile = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        // broadcast runs the loop on every worker and joins them all.
        self.pool.broadcast(|ctx| loop {
            let index = next_tile.fetch_add(1, Ordering::Relaxed);
            let Some(rect) = grid.rect(index) else {
                break;
            };

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                // Safety: each index is handed out exactly once, and tiles
                // of one grid never overlap.
                let mut tile = unsafe { shared.tile(rect) };
                draw(&mut tile);
            }));

            match result {
                Ok(()) => {
                    count_call!(FUNCTION_COUNTERS.tiles_rasterized);
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(payload) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "worker {} failed on tile {} ({:?}): {}",
                        ctx.index(),
                        index,
                        rect,
                        panic_message(payload.as_ref())
                    );
                }
            }
        });

        TileReport {
            tiles_rasterized: completed.into_inner(),
            tile_failures: failed.into_inner(),
        }
    }
}

impl Drop for TileScheduler {
    fn drop(&mut self) {
        log::debug!("Shutting down {} raster workers", self.worker_count());
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    #[test]
    fn grid_covers_buffer_exactly_once() {
        let grid = TileGrid::new(150, 70, 64);
        assert_eq!((grid.cols(), grid.rows()), (3, 2));

        let mut hits = vec![0u8; 150 * 70];
        for rect in grid.iter() {
            for y in rect.y0..rect.y1 {
                for x in rect.x0..rect.x1 {
                    hits[y * 150 + x] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
        assert_eq!(grid.rect(5), Some(TileRect::new(128, 64, 150, 70)));
        assert_eq!(grid.rect(6), None);
    }

    #[test]
    fn zero_workers_or_tile_size_is_rejected() {
        assert!(matches!(TileScheduler::new(0, 64), Err(RenderError::InvalidWorkerCount)));
        assert!(matches!(TileScheduler::new(2, 0), Err(RenderError::InvalidTileSize)));
    }

    #[test]
    fn every_tile_is_claimed_once() {
        let scheduler = TileScheduler::new(3, 16).unwrap();
        let mut fb = Framebuffer::new(100, 50);
        let report = scheduler.for_each_tile(&mut fb, |tile| {
            let r = tile.rect();
            for y in r.y0..r.y1 {
                for x in r.x0..r.x1 {
                    if let Some(idx) = tile.test_depth_and_get_index(x, y, 0.0) {
                        tile.write_color(idx, 1);
                    }
                }
            }
        });
        assert_eq!(report.tiles_rasterized, 7 * 4);
        assert_eq!(report.tile_failures, 0);
        assert!(fb.color_buffer.iter().all(|&c| c == 1));
    }

    #[test]
    fn panicking_tile_does_not_stall_frame() {
        let scheduler = TileScheduler::new(2, 8).unwrap();
        let mut fb = Framebuffer::new(32, 32);
        let report = scheduler.for_each_tile(&mut fb, |tile| {
            if tile.rect().x0 == 8 && tile.rect().y0 == 8 {
                panic!("injected tile failure");
            }
        });
        assert_eq!(report.tile_failures, 1);
        assert_eq!(report.tiles_rasterized, 15);

        // Pool is still usable afterwards.
        let again = scheduler.for_each_tile(&mut fb, |_| {});
        assert_eq!(again.tiles_rasterized, 16);
    }

    #[test]
    fn worker_count_does_not_change_output() {
        let queue: Vec<ProjectedTriangle> = (0..20)
            .map(|i| {
                let o = i * 7;
                ProjectedTriangle {
                    points: [
                        IVec2::new(o % 90, (o * 3) % 70),
                        IVec2::new(o % 90 + 40, (o * 5) % 70),
                        IVec2::new(o % 90 + 10, (o * 3) % 70 + 35),
                    ],
                    depth: [0.1 + i as f32 * 0.01, 0.5, 0.9 - i as f32 * 0.02],
                    light: [0.3, 0.7, 1.0],
                    color: 0x102030 * (i as u32 + 1) & 0xFFFFFF,
                }
            })
            .collect();

        let render = |workers| {
            let scheduler = TileScheduler::new(workers, 16).unwrap();
            let mut fb = Framebuffer::new(120, 90);
            fb.clear(0x87CEEB);
            scheduler.rasterize(&queue, &mut fb);
            fb
        };

        let single = render(1);
        let multi = render(4);
        assert_eq!(single.color_buffer, multi.color_buffer);
        assert_eq!(single.depth_buffer, multi.depth_buffer);
    }
}
