//! Markov clustering (MCL) over a sparse similarity graph.
//!
//! The thresholded edge list becomes a column-stochastic sparse matrix
//! with self-loops. Each round squares the matrix (expansion), raises the
//! entries elementwise to the inflation power, prunes near-zero entries
//! and renormalizes columns (inflation). The loop stops at the iteration
//! cap or when the matrix stabilizes; connected components of the final
//! nonzero pattern are the clusters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::distance_matrix::sparse::SparseMatrixResult;
use crate::error::Result;

/// Parameters for one MCL run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MclParams {
    /// Maximum expansion/inflation rounds.
    pub max_iterations: usize,

    /// Inflation exponent; larger values produce finer clusters.
    pub inflation: f32,

    /// Entries below this value are dropped after each inflation.
    pub pruning_threshold: f32,

    /// The run stops early when no entry changes by more than this
    /// between rounds.
    pub convergence_tolerance: f32,
}

impl Default for MclParams {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            inflation: 2.0,
            pruning_threshold: 1e-5,
            convergence_tolerance: 1e-6,
        }
    }
}

impl MclParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_inflation(mut self, inflation: f32) -> Self {
        self.inflation = inflation;
        self
    }
}

/// Column-major sparse matrix: per column, (row, value) entries sorted by
/// row index.
#[derive(Debug, Clone)]
struct SparseColumns {
    columns: Vec<Vec<(u32, f32)>>,
}

impl SparseColumns {
    fn from_edges(sparse: &SparseMatrixResult, item_count: usize) -> Self {
        let mut columns: Vec<HashMap<u32, f32>> = vec![HashMap::new(); item_count];
        for k in 0..sparse.len() {
            let (i, j) = (sparse.i[k] as usize, sparse.j[k] as usize);
            // edge weight is the similarity; distances are stored
            let w = (1.0 - sparse.distances[k]).max(0.0);
            if w <= 0.0 {
                continue;
            }
            columns[i].insert(sparse.j[k], w);
            columns[j].insert(sparse.i[k], w);
        }
        // self-loops stabilize the flow
        for (i, col) in columns.iter_mut().enumerate() {
            col.insert(i as u32, 1.0);
        }
        let columns = columns
            .into_iter()
            .map(|col| {
                let mut entries: Vec<(u32, f32)> = col.into_iter().collect();
                entries.sort_unstable_by_key(|&(row, _)| row);
                entries
            })
            .collect();
        Self { columns }
    }

    fn normalize_columns(&mut self) {
        for col in self.columns.iter_mut() {
            let sum: f32 = col.iter().map(|&(_, v)| v).sum();
            if sum > 0.0 {
                for entry in col.iter_mut() {
                    entry.1 /= sum;
                }
            }
        }
    }

    /// Sparse matrix square: result column j is the weighted sum of the
    /// columns reachable through j's entries.
    fn expand(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let mut acc: HashMap<u32, f32> = HashMap::new();
                for &(k, w) in col {
                    for &(row, v) in &self.columns[k as usize] {
                        *acc.entry(row).or_insert(0.0) += w * v;
                    }
                }
                let mut entries: Vec<(u32, f32)> = acc.into_iter().collect();
                entries.sort_unstable_by_key(|&(row, _)| row);
                entries
            })
            .collect();
        Self { columns }
    }

    fn inflate(&mut self, power: f32, pruning_threshold: f32) {
        for col in self.columns.iter_mut() {
            for entry in col.iter_mut() {
                entry.1 = entry.1.powf(power);
            }
            let sum: f32 = col.iter().map(|&(_, v)| v).sum();
            if sum > 0.0 {
                for entry in col.iter_mut() {
                    entry.1 /= sum;
                }
            }
            col.retain(|&(_, v)| v >= pruning_threshold);
        }
    }

    /// Largest absolute elementwise difference, over the union of the two
    /// nonzero patterns.
    fn max_difference(&self, other: &SparseColumns) -> f32 {
        let mut max = 0.0f32;
        for (a, b) in self.columns.iter().zip(&other.columns) {
            let mut bm: HashMap<u32, f32> = b.iter().copied().collect();
            for &(row, v) in a {
                let w = bm.remove(&row).unwrap_or(0.0);
                max = max.max((v - w).abs());
            }
            for (_, w) in bm {
                max = max.max(w.abs());
            }
        }
        max
    }
}

/// Disjoint-set forest for reading clusters off the final matrix.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Markov-clustering reducer over sparse similarity graphs.
pub struct MclReducer {
    params: MclParams,
}

impl MclReducer {
    pub fn new(params: MclParams) -> Self {
        Self { params }
    }

    /// Run MCL and assign one cluster id per item. Items untouched by any
    /// edge form singleton clusters.
    pub fn transform(
        &self,
        sparse: &SparseMatrixResult,
        item_count: usize,
        token: &CancellationToken,
    ) -> Result<Vec<u32>> {
        if item_count == 0 {
            return Ok(Vec::new());
        }

        let mut matrix = SparseColumns::from_edges(sparse, item_count);
        matrix.normalize_columns();

        for round in 0..self.params.max_iterations {
            token.check()?;
            let mut next = matrix.expand();
            next.inflate(self.params.inflation, self.params.pruning_threshold);
            let delta = next.max_difference(&matrix);
            matrix = next;
            if delta < self.params.convergence_tolerance {
                tracing::debug!(round, delta, "MCL stabilized early");
                break;
            }
        }

        // connected components of the surviving nonzero pattern
        let mut dsu = UnionFind::new(item_count);
        for (j, col) in matrix.columns.iter().enumerate() {
            for &(row, _) in col {
                dsu.union(j, row as usize);
            }
        }

        let mut labels = vec![0u32; item_count];
        let mut next_label = 0u32;
        let mut by_root: HashMap<usize, u32> = HashMap::new();
        for (i, label) in labels.iter_mut().enumerate() {
            let root = dsu.find(i);
            *label = *by_root.entry(root).or_insert_with(|| {
                let l = next_label;
                next_label += 1;
                l
            });
        }
        Ok(labels)
    }
}
