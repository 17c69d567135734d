/// Performance measurement utilities
/// Each rendering stage is timed and logged for optimization analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

/// Scope timer; logs the elapsed time at trace level when dropped.
pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::trace!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Per-frame timing accumulator, one entry per pipeline phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub clear_us: f64,
    pub geometry_us: f64,
    pub raster_us: f64,
}

impl PhaseTimings {
    pub fn total_us(&self) -> f64 {
        self.clear_us + self.geometry_us + self.raster_us
    }

    pub fn log_summary(&self) {
        let total = self.total_us().max(f64::EPSILON);
        log::debug!(
            "frame {:8.2}μs | clear {:5.1}% | geometry {:5.1}% | raster {:5.1}%",
            total,
            self.clear_us / total * 100.0,
            self.geometry_us / total * 100.0,
            self.raster_us / total * 100.0,
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
