//! # simspace — similarity metrics and embedding pipelines
//!
//! A self-contained engine for similarity analysis of fingerprints and
//! sequences:
//!
//! - **Typed metrics**: set-similarity coefficients over packed bit
//!   vectors (Tanimoto, Dice, Cosine, ...), string distances, vector and
//!   scalar distances, and parametrized macromolecule alignments —
//!   partitioned into data-type buckets with a validated name registry.
//! - **Distance matrices**: condensed upper-triangular storage, built
//!   sequentially, in parallel, or on a background worker.
//! - **Dimensionality reduction**: UMAP, t-SNE and the SPE family behind
//!   one orchestrator with progress reporting, cooperative cancellation
//!   and a materialization policy for large inputs.
//! - **Clustering**: Markov clustering over thresholded sparse similarity
//!   graphs, with a pluggable accelerated backend and transparent CPU
//!   fallback.
//!
//! ## Quick start
//!
//! ```rust
//! use simspace::prelude::*;
//!
//! // fingerprint similarity
//! let a = BitVector::from_set_bits(16, &[0, 1, 2, 3]);
//! let b = BitVector::from_set_bits(16, &[0, 1, 2, 4]);
//! let sim = BitArrayMetric::Tanimoto.similarity(&a, &b);
//! assert!((sim - 0.6).abs() < 1e-6);
//!
//! // full pairwise distance matrix
//! let items = vec![a, b];
//! let matrix = DistanceMatrix::compute(&items, |x, y| {
//!     BitArrayMetric::Tanimoto.distance(x, y)
//! });
//! assert_eq!(matrix.data().len(), 1);
//! ```
//!
//! ## Embedding a column
//!
//! ```rust
//! use simspace::prelude::*;
//!
//! let column = ColumnData::BitVectors(
//!     (0..12)
//!         .map(|i| BitVector::from_set_bits(32, &[i, i + 1, (2 * i) % 32]))
//!         .collect(),
//! );
//! let reducer = DimensionalityReducer::new(
//!     column,
//!     DimReductionMethod::Spe,
//!     MetricName::BitArray(BitArrayMetric::Tanimoto),
//!     ReductionOptions::new().with_seed(42),
//! )
//! .unwrap();
//! let outcome = reducer.transform(&EmbedContext::new()).unwrap();
//! let result = outcome.completed().unwrap();
//! assert_eq!(result.embedding.len(), 12);
//! ```

pub mod bit_vector;
pub mod cluster;
pub mod distance_matrix;
pub mod metrics;
pub mod reduce;
pub mod utils;

mod cancellation;
mod config;
mod error;
mod types;

pub use cancellation::CancellationToken;
pub use config::{ReductionOptions, SpeOptions, TsneOptions, UmapOptions};
pub use error::{ErrorCode, Result, SimError};
pub use types::{transpose_embedding, Embedding, ProgressFn, SharedProgress};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bit_vector::BitVector;
    pub use crate::cancellation::CancellationToken;
    pub use crate::cluster::{
        AcceleratedMclBackend, ClusterRequest, ClusterService, MclParams, MclReducer,
    };
    pub use crate::config::{ReductionOptions, SpeOptions, TsneOptions, UmapOptions};
    pub use crate::distance_matrix::service::{DistanceMatrixRequest, DistanceMatrixService};
    pub use crate::distance_matrix::sparse::{
        calc_sparse, calc_sparse_multi_column, knn_from_edges, DistanceAggregationMethod,
        SparseMatrixResult,
    };
    pub use crate::distance_matrix::{DistanceMatrix, MAX_DISTANCE_MATRIX_ROWS};
    pub use crate::error::{ErrorCode, Result, SimError};
    pub use crate::metrics::measure::{ColumnData, Measure, MetricOptions};
    pub use crate::metrics::{
        available_metrics, registry, BitArrayMetric, DataType, MacroMoleculeMetric, MetricName,
        NumberMetric, StringMetric, VectorMetric, CHEM_SIMILARITY_METRICS,
        SEQ_SPACE_SIMILARITY_METRICS,
    };
    pub use crate::reduce::{
        available_methods, reduce_with_normalization, DimReductionMethod, DimensionalityReducer,
        EmbedContext, ReductionOutcome, ReductionRequest, ReductionResult, ReductionRunner,
    };
    pub use crate::types::{transpose_embedding, Embedding, SharedProgress};
    pub use crate::utils::{diverse_subset, RandomSampler};
}
