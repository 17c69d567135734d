/// Instrumentation for the rasterizer hot loops
/// Counters are compiled in only with the `profiling` feature
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe performance counters for function call tracking
pub struct FunctionCounters {
    // Geometry counters
    pub clip_triangle_calls: AtomicU64,
    pub clip_triangle_split: AtomicU64,

    // Rasterization counters
    pub fill_triangle_calls: AtomicU64,
    pub fill_triangle_rejected: AtomicU64,
    pub fill_span_calls: AtomicU64,
    pub set_pixel_attempts: AtomicU64,
    pub set_pixel_depth_passed: AtomicU64,
    pub set_pixel_depth_failed: AtomicU64,

    // Framebuffer counters
    pub framebuffer_clear_calls: AtomicU64,
    pub tiles_rasterized: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            clip_triangle_calls: AtomicU64::new(0),
            clip_triangle_split: AtomicU64::new(0),
            fill_triangle_calls: AtomicU64::new(0),
            fill_triangle_rejected: AtomicU64::new(0),
            fill_span_calls: AtomicU64::new(0),
            set_pixel_attempts: AtomicU64::new(0),
            set_pixel_depth_passed: AtomicU64::new(0),
            set_pixel_depth_failed: AtomicU64::new(0),
            framebuffer_clear_calls: AtomicU64::new(0),
            tiles_rasterized: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn all(&self) -> [&AtomicU64; 10] {
        [
            &self.clip_triangle_calls,
            &self.clip_triangle_split,
            &self.fill_triangle_calls,
            &self.fill_triangle_rejected,
            &self.fill_span_calls,
            &self.set_pixel_attempts,
            &self.set_pixel_depth_passed,
            &self.set_pixel_depth_failed,
            &self.framebuffer_clear_calls,
            &self.tiles_rasterized,
        ]
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            clip_triangle_calls: self.clip_triangle_calls.load(Ordering::Relaxed),
            clip_triangle_split: self.clip_triangle_split.load(Ordering::Relaxed),
            fill_triangle_calls: self.fill_triangle_calls.load(Ordering::Relaxed),
            fill_triangle_rejected: self.fill_triangle_rejected.load(Ordering::Relaxed),
            fill_span_calls: self.fill_span_calls.load(Ordering::Relaxed),
            set_pixel_attempts: self.set_pixel_attempts.load(Ordering::Relaxed),
            set_pixel_depth_passed: self.set_pixel_depth_passed.load(Ordering::Relaxed),
            set_pixel_depth_failed: self.set_pixel_depth_failed.load(Ordering::Relaxed),
            framebuffer_clear_calls: self.framebuffer_clear_calls.load(Ordering::Relaxed),
            tiles_rasterized: self.tiles_rasterized.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub clip_triangle_calls: u64,
    pub clip_triangle_split: u64,
    pub fill_triangle_calls: u64,
    pub fill_triangle_rejected: u64,
    pub fill_span_calls: u64,
    pub set_pixel_attempts: u64,
    pub set_pixel_depth_passed: u64,
    pub set_pixel_depth_failed: u64,
    pub framebuffer_clear_calls: u64,
    pub tiles_rasterized: u64,
}

impl CounterSnapshot {
    /// Log a formatted report at info level
    pub fn log_report(&self) {
        log::info!("=== Performance Counters Report ===");
        log::info!("Geometry:");
        log::info!("  clip_triangle calls:        {:12}", self.clip_triangle_calls);
        log::info!("  clip produced two:          {:12}", self.clip_triangle_split);

        log::info!("Rasterization:");
        log::info!("  fill_triangle calls:        {:12}", self.fill_triangle_calls);
        log::info!("  rejected by tile bounds:    {:12}", self.fill_triangle_rejected);
        log::info!("  fill_span calls:            {:12}", self.fill_span_calls);

        log::info!("Pixel Operations:");
        log::info!("  set_pixel attempts:         {:12}", self.set_pixel_attempts);
        log::info!("  depth test passed:          {:12}", self.set_pixel_depth_passed);
        log::info!("  depth test failed:          {:12}", self.set_pixel_depth_failed);
        if self.set_pixel_attempts > 0 {
            let pass_rate =
                (self.set_pixel_depth_passed as f64 / self.set_pixel_attempts as f64) * 100.0;
            log::info!("  depth test pass rate:       {:11.2}%", pass_rate);
        }

        log::info!("Framebuffer:");
        log::info!("  clear calls:                {:12}", self.framebuffer_clear_calls);
        log::info!("  tiles rasterized:           {:12}", self.tiles_rasterized);
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
