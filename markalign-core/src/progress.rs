//! Progress reporting for the parallel stages

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress of a parallel stage. Called concurrently from workers.
pub trait ProgressReporter: Send + Sync {
    /// A stage over `total` items begins.
    fn start(&self, stage: &str, total: u64);

    /// A worker claimed the batch `[begin, end)`.
    fn advance(&self, begin: u64, end: u64);

    fn finish(&self);
}

/// Reporter that logs every time a claimed batch crosses a multiple of
/// `interval` items.
#[derive(Debug)]
pub struct LogProgress {
    interval: u64,
    total: AtomicU64,
}

impl LogProgress {
    pub const DEFAULT_INTERVAL: u64 = 1_000_000;

    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            total: AtomicU64::new(0),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl ProgressReporter for LogProgress {
    fn start(&self, stage: &str, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        log::info!("{}: {} items", stage, total);
    }

    fn advance(&self, begin: u64, end: u64) {
        // Log once per interval boundary inside [begin, end).
        let boundary = begin.div_ceil(self.interval) * self.interval;
        if boundary < end {
            log::info!(
                "Working on {} of {}",
                boundary,
                self.total.load(Ordering::Relaxed)
            );
        }
    }

    fn finish(&self) {}
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _stage: &str, _total: u64) {}
    fn advance(&self, _begin: u64, _end: u64) {}
    fn finish(&self) {}
}
