//! Sparse similarity graphs and multi-column composite distances.
//!
//! Instead of materializing all N*(N-1)/2 cells, only the pairs whose
//! similarity (1 - normalized distance) reaches a threshold are kept, as
//! parallel `(i, j, distance)` arrays. Multiple columns are combined into
//! one composite distance per pair through a weighted aggregation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::error::{Result, SimError};
use crate::metrics::measure::{ColumnData, Measure, MetricOptions, PairDistanceFn};
use crate::metrics::MetricName;

/// How per-column distances are combined into one composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceAggregationMethod {
    /// Weighted mean of the per-column distances.
    #[default]
    Manhattan,
    /// Weighted root-mean-square of the per-column distances.
    Euclidean,
}

impl DistanceAggregationMethod {
    fn aggregate(&self, distances: &[f32], weights: &[f32]) -> f32 {
        let total_weight: f32 = weights.iter().sum();
        if total_weight == 0.0 {
            return 0.0;
        }
        match self {
            DistanceAggregationMethod::Manhattan => {
                let sum: f32 = distances.iter().zip(weights).map(|(d, w)| d * w).sum();
                sum / total_weight
            }
            DistanceAggregationMethod::Euclidean => {
                let sum: f32 = distances.iter().zip(weights).map(|(d, w)| d * d * w).sum();
                (sum / total_weight).sqrt()
            }
        }
    }
}

/// Edges of a thresholded similarity graph: parallel arrays of row index,
/// column index (row < column) and the composite distance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseMatrixResult {
    pub i: Vec<u32>,
    pub j: Vec<u32>,
    pub distances: Vec<f32>,
}

impl SparseMatrixResult {
    /// Number of stored edges.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Build a sparse similarity graph from a single column.
///
/// `threshold` is a similarity fraction in [0, 1]: a pair is kept when
/// `1 - distance >= threshold`.
pub fn calc_sparse(
    data: &ColumnData,
    metric: MetricName,
    opts: &MetricOptions,
    threshold: f32,
) -> Result<SparseMatrixResult> {
    calc_sparse_multi_column(
        std::slice::from_ref(data),
        &[metric],
        threshold,
        std::slice::from_ref(opts),
        &[1.0],
        DistanceAggregationMethod::Manhattan,
        &CancellationToken::new(),
    )
}

/// Build a sparse similarity graph from several columns combined through a
/// weighted aggregation. Columns, metrics, options and weights must all
/// have the same length, and every column the same row count; anything
/// else is a configuration error raised before computation starts.
#[allow(clippy::too_many_arguments)]
pub fn calc_sparse_multi_column(
    columns: &[ColumnData],
    metrics: &[MetricName],
    threshold: f32,
    metric_opts: &[MetricOptions],
    weights: &[f32],
    aggregation: DistanceAggregationMethod,
    token: &CancellationToken,
) -> Result<SparseMatrixResult> {
    if columns.is_empty() {
        return Err(SimError::invalid_argument("at least one column is required"));
    }
    if columns.len() != metrics.len()
        || columns.len() != weights.len()
        || columns.len() != metric_opts.len()
    {
        return Err(SimError::invalid_argument(format!(
            "columns ({}), metrics ({}), weights ({}) and metric options ({}) must have the same length",
            columns.len(),
            metrics.len(),
            weights.len(),
            metric_opts.len(),
        )));
    }
    let n = columns[0].len();
    if columns.iter().any(|c| c.len() != n) {
        return Err(SimError::invalid_argument(
            "all columns must have the same row count",
        ));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SimError::invalid_argument(format!(
            "similarity threshold must be within [0, 1], got {threshold}"
        )));
    }

    let fns: Vec<PairDistanceFn<'_>> = columns
        .iter()
        .zip(metrics)
        .zip(metric_opts)
        .map(|((col, &metric), opts)| Measure::new(metric).bind(col, opts))
        .collect::<Result<_>>()?;

    let max_distance = 1.0 - threshold;
    let mut edges: Vec<Vec<(u32, u32, f32)>> = Vec::with_capacity(n.saturating_sub(1));
    for i in 0..n.saturating_sub(1) {
        token.check()?;
        let row: Vec<(u32, u32, f32)> = ((i + 1)..n)
            .into_par_iter()
            .filter_map(|j| {
                let per_column: Vec<f32> = fns.iter().map(|f| f(i, j)).collect();
                let d = aggregation.aggregate(&per_column, weights);
                (d <= max_distance).then_some((i as u32, j as u32, d))
            })
            .collect();
        edges.push(row);
    }

    let mut result = SparseMatrixResult::default();
    for (i, j, d) in edges.into_iter().flatten() {
        result.i.push(i);
        result.j.push(j);
        result.distances.push(d);
    }
    Ok(result)
}

/// k-nearest-neighbor lists extracted from a sparse edge list.
#[derive(Debug, Clone)]
pub struct KnnGraph {
    /// Neighbor indices per item, ascending by distance.
    pub indexes: Vec<Vec<usize>>,
    /// Neighbor distances per item, ascending.
    pub distances: Vec<Vec<f32>>,
}

/// Convert an edge list into per-item k-nearest-neighbor rows. Both
/// directions of every edge are considered; rows start saturated with
/// placeholder distance 1, so absent neighbors read as maximally distant.
pub fn knn_from_edges(sparse: &SparseMatrixResult, neighbours: usize, data_length: usize) -> KnnGraph {
    let mut indexes = vec![vec![1usize; neighbours]; data_length];
    let mut distances = vec![vec![1.0f32; neighbours]; data_length];

    let mut insert = |item: usize, neighbor: usize, d: f32| {
        let row_d = &mut distances[item];
        let row_i = &mut indexes[item];
        if d > row_d[neighbours - 1] {
            return;
        }
        let pos = row_d.partition_point(|&existing| existing <= d);
        row_d.pop();
        row_d.insert(pos, d);
        row_i.pop();
        row_i.insert(pos, neighbor);
    };

    for k in 0..sparse.len() {
        let (i, j, d) = (sparse.i[k] as usize, sparse.j[k] as usize, sparse.distances[k]);
        insert(i, j, d);
        insert(j, i, d);
    }

    KnnGraph { indexes, distances }
}
