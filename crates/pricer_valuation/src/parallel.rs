//! Rayon-based parallel-for over disjoint index ranges.
//!
//! All three parallel phases of a valuation (path simulation, early-exercise
//! resolution and forward-date regression) go through
//! [`ParallelExecutor::try_map`]. Each work item owns its input outright, so
//! no locking is needed, and the first error stops the remaining items.

use std::ops::Range;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::ValuationConfig;
use crate::error::ValuationError;

/// Runs work items sequentially or on a dedicated rayon pool.
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: Option<ThreadPool>,
    threads: usize,
}

impl ParallelExecutor {
    /// Executor that always runs on the calling thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            threads: 1,
        }
    }

    /// Executor with `threads` workers. One thread means sequential.
    ///
    /// # Errors
    ///
    /// `ValuationError::ThreadPool` if rayon cannot spawn the pool.
    pub fn with_threads(threads: usize) -> Result<Self, ValuationError> {
        if threads <= 1 {
            return Ok(Self::sequential());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("valuation-worker-{i}"))
            .build()
            .map_err(|e| ValuationError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: Some(pool),
            threads,
        })
    }

    /// Executor sized by the configuration's worker thread count.
    pub fn from_config(config: &ValuationConfig) -> Result<Self, ValuationError> {
        Self::with_threads(config.worker_threads())
    }

    /// Number of worker threads.
    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Whether `n_items` reaches `threshold` and there is more than one worker.
    #[inline]
    pub fn should_parallelize(&self, n_items: usize, threshold: usize) -> bool {
        self.pool.is_some() && n_items >= threshold
    }

    /// Maps `f` over `items`, preserving order.
    ///
    /// Runs on the pool when `parallel` is set and a pool exists, otherwise
    /// in order on the calling thread. Returns the first error encountered.
    pub fn try_map<T, R, E, F>(&self, items: Vec<T>, parallel: bool, f: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Sync + Send,
    {
        match &self.pool {
            Some(pool) if parallel => pool.install(|| items.into_par_iter().map(&f).collect()),
            _ => items.into_iter().map(f).collect(),
        }
    }
}

/// Splits `0..n` into at most `chunks` contiguous, non-empty ranges of
/// near-equal length.
///
/// ```
/// use pricer_valuation::parallel::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition(2, 4), vec![0..1, 1..2]);
/// ```
pub fn partition(n: usize, chunks: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let chunk_len = n.div_ceil(chunks.max(1));
    (0..n)
        .step_by(chunk_len)
        .map(|start| start..(start + chunk_len).min(n))
        .collect()
}

/// Splits `cells` into one mutable slice per range, `per_item` cells per index.
///
/// The ranges must be contiguous and start at 0, as produced by [`partition`].
pub(crate) fn split_ranges_mut<'a, T>(
    mut cells: &'a mut [T],
    per_item: usize,
    ranges: &[Range<usize>],
) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut cells).split_at_mut(range.len() * per_item);
        out.push(head);
        cells = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_range() {
        let ranges = partition(1001, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[3].end, 1001);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(0, 4).is_empty());
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_split_ranges_mut_is_disjoint() {
        let mut cells: Vec<usize> = vec![0; 10 * 3];
        let ranges = partition(10, 3);
        for (range, chunk) in ranges.iter().zip(split_ranges_mut(&mut cells, 3, &ranges)) {
            assert_eq!(chunk.len(), range.len() * 3);
            for cell in chunk.iter_mut() {
                *cell = range.start;
            }
        }
        assert_eq!(cells[0], 0);
        assert_eq!(cells[4 * 3], 4);
        assert_eq!(cells[29], 8);
    }

    #[test]
    fn test_split_ranges_mut_zero_width() {
        let mut cells: Vec<f64> = Vec::new();
        let ranges = partition(6, 2);
        let chunks = split_ranges_mut(&mut cells, 0, &ranges);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_try_map_preserves_order() {
        let executor = ParallelExecutor::with_threads(4).unwrap();
        let out: Result<Vec<usize>, ()> =
            executor.try_map((0..100).collect(), true, |i| Ok(i * 2));
        assert_eq!(out.unwrap(), (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_map_propagates_error() {
        let executor = ParallelExecutor::with_threads(2).unwrap();
        let out: Result<Vec<usize>, String> = executor.try_map((0..50).collect(), true, |i| {
            if i == 17 {
                Err(format!("failed at {i}"))
            } else {
                Ok(i)
            }
        });
        assert_eq!(out, Err("failed at 17".to_string()));
    }

    #[test]
    fn test_should_parallelize() {
        let sequential = ParallelExecutor::sequential();
        assert!(!sequential.should_parallelize(10_000, 1000));
        let pooled = ParallelExecutor::with_threads(2).unwrap();
        assert!(pooled.should_parallelize(1000, 1000));
        assert!(!pooled.should_parallelize(999, 1000));
    }
}
