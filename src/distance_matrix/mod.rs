//! Condensed pairwise distance matrices.
//!
//! The full symmetric, zero-diagonal matrix over N items is stored as a
//! flat array of the upper triangle only: N*(N-1)/2 cells, row-major over
//! increasing row index. Each cell is computed independently, so the
//! parallel build writes disjoint row ranges of the same buffer and is
//! cell-for-cell identical to the sequential build.

pub mod service;
pub mod sparse;

use rayon::prelude::*;

use crate::cancellation::CancellationToken;
use crate::error::{Result, SimError};

/// Above this row count the full matrix is not materialized by default;
/// the caller must opt in explicitly (an N=100k matrix is ~20 GB).
pub const MAX_DISTANCE_MATRIX_ROWS: usize = 20000;

/// Number of condensed cells for `n` items.
#[inline]
pub fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Linear index of the pair `(i, j)` with `i < j` in the condensed layout:
/// the lengths of all rows before `i`, plus the offset within row `i`.
#[inline]
pub fn linear_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i < j && j < n, "requires i < j < n");
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

/// Dense symmetric zero-diagonal distance matrix in condensed form.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f32>,
    n: usize,
}

impl DistanceMatrix {
    /// Create a zero matrix over `n` items.
    pub fn new(n: usize) -> Self {
        Self {
            data: vec![0.0; condensed_len(n)],
            n,
        }
    }

    /// Wrap an existing condensed buffer; its length must match `n`.
    pub fn from_data(data: Vec<f32>, n: usize) -> Result<Self> {
        if data.len() != condensed_len(n) {
            return Err(SimError::invalid_argument(format!(
                "condensed buffer for {} items must hold {} cells, got {}",
                n,
                condensed_len(n),
                data.len()
            )));
        }
        Ok(Self { data, n })
    }

    /// Number of items (rows).
    pub fn size(&self) -> usize {
        self.n
    }

    /// Whether the matrix holds no pairs (0 or 1 items).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The condensed cell buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume into the condensed cell buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Distance between items `i` and `j` (0 on the diagonal).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        if i == j {
            0.0
        } else if i < j {
            self.data[linear_index(i, j, self.n)]
        } else {
            self.data[linear_index(j, i, self.n)]
        }
    }

    /// Set the distance between items `i` and `j`, `i != j`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        let idx = if i < j {
            linear_index(i, j, self.n)
        } else {
            linear_index(j, i, self.n)
        };
        self.data[idx] = value;
    }

    /// Compute the full matrix sequentially.
    pub fn compute<T>(items: &[T], metric: impl Fn(&T, &T) -> f32) -> Self {
        Self::compute_pairs(items.len(), |i, j| metric(&items[i], &items[j]))
    }

    /// Compute from a position-indexed pair function.
    pub fn compute_pairs(n: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut m = Self::new(n);
        let mut idx = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                m.data[idx] = f(i, j);
                idx += 1;
            }
        }
        m
    }

    /// Compute the full matrix with rows partitioned across rayon workers.
    /// Each worker fills a disjoint contiguous row range, so the result is
    /// identical to [`DistanceMatrix::compute`].
    pub fn compute_parallel<T: Sync>(
        items: &[T],
        metric: impl Fn(&T, &T) -> f32 + Sync,
    ) -> Self {
        Self::compute_pairs_parallel(items.len(), |i, j| metric(&items[i], &items[j]))
    }

    /// Parallel variant of [`DistanceMatrix::compute_pairs`].
    pub fn compute_pairs_parallel(n: usize, f: impl Fn(usize, usize) -> f32 + Sync) -> Self {
        let mut data = vec![0.0f32; condensed_len(n)];

        // carve the flat buffer into per-row slices (row i holds n-1-i cells)
        let mut rows: Vec<(usize, &mut [f32])> = Vec::with_capacity(n);
        let mut rest = data.as_mut_slice();
        for i in 0..n {
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(n - 1 - i);
            rows.push((i, row));
            rest = tail;
        }

        rows.into_par_iter().for_each(|(i, row)| {
            for (offset, cell) in row.iter_mut().enumerate() {
                *cell = f(i, i + 1 + offset);
            }
        });

        Self { data, n }
    }

    /// Cancellable parallel build: the token is polled between rows, and a
    /// cancelled build returns `Err(Cancelled)` with no partial matrix.
    pub fn compute_pairs_cancellable(
        n: usize,
        f: impl Fn(usize, usize) -> f32 + Sync,
        token: &CancellationToken,
    ) -> Result<Self> {
        let mut m = Self::new(n);
        let mut rest = m.data.as_mut_slice();
        for i in 0..n {
            token.check()?;
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(n - 1 - i);
            row.par_iter_mut().enumerate().for_each(|(offset, cell)| {
                *cell = f(i, i + 1 + offset);
            });
            rest = tail;
        }
        Ok(m)
    }

    /// Largest cell value (0 for an empty matrix).
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    /// Divide every cell by the matrix maximum so downstream embedders see
    /// a bounded distance scale. No-op when the maximum is 0.
    pub fn normalize(&mut self) {
        let max = self.max();
        if max > 0.0 {
            for v in self.data.iter_mut() {
                *v /= max;
            }
        }
    }
}
