//! Parallel execution helpers.

use rayon::prelude::*;

/// Minimum number of items before parallelization is beneficial.
/// Below this threshold, sequential execution is faster due to overhead.
pub const MIN_PARALLEL_SIZE: usize = 512;

/// Execute a map operation, choosing parallel or sequential based on size.
#[inline]
pub fn maybe_parallel_map<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    maybe_parallel_map_threshold(items, MIN_PARALLEL_SIZE, f)
}

/// Execute a map operation with a custom parallelization threshold.
#[inline]
pub fn maybe_parallel_map_threshold<T, U, F>(items: &[T], threshold: usize, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if items.len() >= threshold {
        items.par_iter().map(&f).collect()
    } else {
        items.iter().map(f).collect()
    }
}
