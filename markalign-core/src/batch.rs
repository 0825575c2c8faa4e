//! Dynamic batch scheduling over an index range
//!
//! Workers claim consecutive `[begin, end)` ranges from a shared atomic
//! cursor until the range is exhausted.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Batch size used to split `total` items across `thread_count` workers:
/// an even share per thread, capped at `max_batch_size`, never below 1.
pub fn batch_size(total: u64, thread_count: usize, max_batch_size: u64) -> u64 {
    let share = total / thread_count.max(1) as u64;
    share.min(max_batch_size).max(1)
}

/// Resolve a configured thread count, where 0 means all available cores.
pub fn resolve_thread_count(thread_count: usize) -> usize {
    if thread_count == 0 {
        num_cpus::get()
    } else {
        thread_count
    }
}

/// Shared cursor handing out batches of an index range.
#[derive(Debug)]
pub struct BatchQueue {
    next: AtomicU64,
    total: u64,
    batch_size: u64,
}

impl BatchQueue {
    pub fn new(total: u64, batch_size: u64) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            next: AtomicU64::new(0),
            total,
            batch_size,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Claim the next unprocessed batch, or `None` once the range is drained.
    pub fn next_batch(&self) -> Option<Range<u64>> {
        let begin = self.next.fetch_add(self.batch_size, Ordering::Relaxed);
        if begin >= self.total {
            return None;
        }
        Some(begin..(begin + self.batch_size).min(self.total))
    }
}

/// Build the dedicated worker pool for one parallel stage.
pub fn build_pool(thread_count: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .thread_name(|index| format!("markalign-worker-{}", index))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size() {
        assert_eq!(batch_size(100, 4, 10_000), 25);
        assert_eq!(batch_size(1_000_000, 4, 10_000), 10_000);
        assert_eq!(batch_size(3, 8, 10_000), 1);
        assert_eq!(batch_size(0, 8, 10_000), 1);
        assert_eq!(batch_size(100, 0, 10_000), 100);
    }

    #[test]
    fn test_batches_cover_range() {
        let queue = BatchQueue::new(10, 4);
        assert_eq!(queue.next_batch(), Some(0..4));
        assert_eq!(queue.next_batch(), Some(4..8));
        assert_eq!(queue.next_batch(), Some(8..10));
        assert_eq!(queue.next_batch(), None);
        assert_eq!(queue.next_batch(), None);
    }

    #[test]
    fn test_empty_range() {
        let queue = BatchQueue::new(0, 1);
        assert_eq!(queue.next_batch(), None);
    }

    #[test]
    fn test_every_index_claimed_once_across_threads() {
        let total = 10_007u64;
        let queue = BatchQueue::new(total, 13);
        let pool = build_pool(4).unwrap();
        let claimed: Vec<Vec<u64>> = pool.broadcast(|_| {
            let mut mine = Vec::new();
            while let Some(batch) = queue.next_batch() {
                mine.extend(batch);
            }
            mine
        });
        let mut all: Vec<u64> = claimed.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..total).collect::<Vec<_>>());
    }

    #[test]
    fn test_resolve_thread_count() {
        assert_eq!(resolve_thread_count(3), 3);
        assert!(resolve_thread_count(0) >= 1);
    }
}
