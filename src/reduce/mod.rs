//! Dimensionality-reduction orchestration.
//!
//! One reduction run moves through strict stages: prepare (resolve the
//! metric, validate inputs) → distances (materialize the matrix or bind an
//! on-demand pair function) → embed (iterative algorithm) → done. A failure
//! in any stage aborts the whole run; cooperative cancellation resolves the
//! run as [`ReductionOutcome::Cancelled`], never as success or error.

mod spe;
mod tsne;
mod umap;

pub use spe::SpeVariant;
pub use umap::effective_neighbors;

use std::fmt;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cancellation::CancellationToken;
use crate::config::ReductionOptions;
use crate::distance_matrix::service::{DistanceMatrixRequest, DistanceMatrixService};
use crate::distance_matrix::{DistanceMatrix, MAX_DISTANCE_MATRIX_ROWS};
use crate::error::{Result, SimError};
use crate::metrics::measure::{ColumnData, Measure, MetricOptions, PairDistanceFn};
use crate::metrics::MetricName;
use crate::types::{standardize_axis, Embedding, SharedProgress};

/// The available embedding methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimReductionMethod {
    Umap,
    TSne,
    Spe,
    PSpe,
    OriginalSpe,
}

impl DimReductionMethod {
    /// All methods, in UI order.
    pub fn all() -> [DimReductionMethod; 5] {
        [
            DimReductionMethod::Umap,
            DimReductionMethod::TSne,
            DimReductionMethod::Spe,
            DimReductionMethod::PSpe,
            DimReductionMethod::OriginalSpe,
        ]
    }

    /// Wire/UI name.
    pub fn name(&self) -> &'static str {
        match self {
            DimReductionMethod::Umap => "UMAP",
            DimReductionMethod::TSne => "t-SNE",
            DimReductionMethod::Spe => "SPE",
            DimReductionMethod::PSpe => "pSPE",
            DimReductionMethod::OriginalSpe => "OriginalSPE",
        }
    }

    /// Resolve a wire name.
    pub fn parse(name: &str) -> Option<DimReductionMethod> {
        Self::all().into_iter().find(|m| m.name() == name)
    }

    /// Whether the method cannot run without a materialized matrix.
    fn requires_materialized_matrix(&self) -> bool {
        matches!(self, DimReductionMethod::TSne)
    }
}

impl fmt::Display for DimReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for DimReductionMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DimReductionMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        DimReductionMethod::parse(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown reduction method '{name}'")))
    }
}

/// Names of the available methods (UI contract).
pub fn available_methods() -> Vec<&'static str> {
    DimReductionMethod::all().iter().map(|m| m.name()).collect()
}

/// Where embedders read pairwise distances from.
pub enum DistanceSource<'a> {
    /// A materialized, normalized condensed matrix.
    Matrix(DistanceMatrix),
    /// Per-pair evaluation of the bound metric on every access — the
    /// space/time trade-off taken above the materialization cap.
    OnDemand { f: PairDistanceFn<'a>, n: usize },
}

impl DistanceSource<'_> {
    /// Number of items.
    pub fn size(&self) -> usize {
        match self {
            DistanceSource::Matrix(m) => m.size(),
            DistanceSource::OnDemand { n, .. } => *n,
        }
    }

    /// Distance between items `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        match self {
            DistanceSource::Matrix(m) => m.get(i, j),
            DistanceSource::OnDemand { f, .. } => {
                if i == j {
                    0.0
                } else {
                    f(i, j)
                }
            }
        }
    }

    fn into_matrix(self) -> Option<DistanceMatrix> {
        match self {
            DistanceSource::Matrix(m) => Some(m),
            DistanceSource::OnDemand { .. } => None,
        }
    }
}

/// Per-run context shared by all embedders: progress sink, cancellation
/// token and the random seed.
#[derive(Default, Clone)]
pub struct EmbedContext {
    pub progress: Option<SharedProgress>,
    pub cancellation: CancellationToken,
    pub seed: Option<u64>,
}

impl EmbedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Fire-and-forget progress report.
    pub(crate) fn report(&self, epoch: usize, total: usize, snapshot: &[[f32; 2]]) {
        if let Some(progress) = &self.progress {
            progress(epoch, total, snapshot);
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        self.cancellation.check()
    }
}

/// An iterative 2-D embedding algorithm driven by pairwise distances.
pub(crate) trait Embedder {
    fn embed(&self, source: &DistanceSource<'_>, ctx: &EmbedContext) -> Result<Embedding>;
}

/// Result of a completed reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductionResult {
    /// One (x, y) pair per input item, in input order.
    pub embedding: Embedding,
    /// The normalized condensed distance matrix, when it was materialized
    /// and the caller asked to keep it.
    pub distance: Option<Vec<f32>>,
}

impl ReductionResult {
    /// The embedding as two parallel axis arrays (all x, then all y) —
    /// the transposed layout some callers prefer.
    pub fn axes(&self) -> [Vec<f32>; 2] {
        crate::types::transpose_embedding(&self.embedding)
    }
}

/// Terminal state of a reduction run. Cancellation is a distinct non-error
/// outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReductionOutcome {
    Completed(ReductionResult),
    Cancelled,
}

impl ReductionOutcome {
    /// The completed result, if the run was not cancelled.
    pub fn completed(self) -> Option<ReductionResult> {
        match self {
            ReductionOutcome::Completed(r) => Some(r),
            ReductionOutcome::Cancelled => None,
        }
    }
}

/// Whether the run materializes the full distance matrix.
///
/// At or below [`MAX_DISTANCE_MATRIX_ROWS`], or on explicit opt-in, the
/// matrix is built once. Above the cap, methods that can evaluate distances
/// on demand fall back to per-pair computation (logged); t-SNE has no such
/// fallback and refuses with a resource-limit error naming the override.
pub fn materialize_decision(
    method: DimReductionMethod,
    n_items: usize,
    precompute: bool,
) -> Result<bool> {
    if n_items <= MAX_DISTANCE_MATRIX_ROWS || precompute {
        return Ok(true);
    }
    if method.requires_materialized_matrix() {
        return Err(SimError::resource_exhausted(format!(
            "{} on {} items needs a full distance matrix, above the {} row cap; \
             set precompute_distance_matrix to allocate it anyway",
            method, n_items, MAX_DISTANCE_MATRIX_ROWS
        )));
    }
    tracing::warn!(
        rows = n_items,
        cap = MAX_DISTANCE_MATRIX_ROWS,
        "row count above the materialization cap; distances will be \
         recomputed per pair"
    );
    Ok(false)
}

/// Unified entry point over the embedding methods.
///
/// Owns one run's inputs; concurrent runs on different instances share no
/// mutable state.
pub struct DimensionalityReducer {
    data: ColumnData,
    method: DimReductionMethod,
    metric: MetricName,
    options: ReductionOptions,
}

impl DimensionalityReducer {
    /// Create a reducer, validating the metric/data pairing up front.
    pub fn new(
        data: ColumnData,
        method: DimReductionMethod,
        metric: MetricName,
        options: ReductionOptions,
    ) -> Result<Self> {
        // fail fast on metric/data mismatch before any computation
        Measure::new(metric).bind(&data, &options.metric_options)?;
        Ok(Self {
            data,
            method,
            metric,
            options,
        })
    }

    /// Metric names valid for the given data-type bucket.
    pub fn available_metrics_by_type(
        data_type: crate::metrics::DataType,
    ) -> Vec<MetricName> {
        crate::metrics::registry().metrics_by_data_type(data_type)
    }

    /// Run the reduction to completion, cancellation or failure.
    pub fn transform(&self, ctx: &EmbedContext) -> Result<ReductionOutcome> {
        match self.run(ctx) {
            Ok(result) => Ok(ReductionOutcome::Completed(result)),
            Err(e) if e.is_cancelled() => Ok(ReductionOutcome::Cancelled),
            Err(e) => Err(e),
        }
    }

    fn run(&self, ctx: &EmbedContext) -> Result<ReductionResult> {
        let n = self.data.len();
        // trivial inputs embed trivially, they are not errors
        if n <= 1 {
            let embedding = vec![[0.0, 0.0]; n];
            return Ok(ReductionResult {
                embedding,
                distance: None,
            });
        }

        let materialize =
            materialize_decision(self.method, n, self.options.precompute_distance_matrix)?;
        ctx.check_cancelled()?;

        let source = if materialize {
            let matrix = if self.options.parallel_distance {
                let service = DistanceMatrixService::spawn(
                    DistanceMatrixRequest {
                        data: self.data.clone(),
                        metric: self.metric,
                        metric_options: self.options.metric_options.clone(),
                        normalize: true,
                    },
                    ctx.cancellation.clone(),
                );
                service.wait()?
            } else {
                let f = Measure::new(self.metric).bind(&self.data, &self.options.metric_options)?;
                let mut m = DistanceMatrix::compute_pairs_cancellable(
                    n,
                    |i, j| f(i, j),
                    &ctx.cancellation,
                )?;
                m.normalize();
                m
            };
            DistanceSource::Matrix(matrix)
        } else {
            let f = Measure::new(self.metric).bind(&self.data, &self.options.metric_options)?;
            DistanceSource::OnDemand { f, n }
        };
        ctx.check_cancelled()?;

        let embedding = self.embedder().embed(&source, ctx)?;

        let distance = if self.options.keep_distance_matrix {
            source.into_matrix().map(|m| m.into_data())
        } else {
            None
        };

        Ok(ReductionResult {
            embedding,
            distance,
        })
    }

    fn embedder(&self) -> Box<dyn Embedder> {
        let cycles = self.options.cycles;
        match self.method {
            DimReductionMethod::Umap => {
                let mut options = self.options.umap.clone();
                if let Some(c) = cycles {
                    options.n_epochs = c;
                }
                Box::new(umap::UmapEmbedder::new(options))
            }
            DimReductionMethod::TSne => {
                let mut options = self.options.tsne.clone();
                if let Some(c) = cycles {
                    options.iterations = c;
                }
                Box::new(tsne::TsneEmbedder::new(options))
            }
            DimReductionMethod::Spe | DimReductionMethod::PSpe | DimReductionMethod::OriginalSpe => {
                let mut options = self.options.spe.clone();
                if let Some(c) = cycles {
                    options.cycles = c;
                }
                let variant = match self.method {
                    DimReductionMethod::Spe => SpeVariant::Base,
                    DimReductionMethod::PSpe => SpeVariant::Pivot,
                    _ => SpeVariant::Original,
                };
                Box::new(spe::SpeEmbedder::new(options, variant))
            }
        }
    }
}

/// Run a reduction and standardize each output axis to zero mean and unit
/// variance, the form scatter-plot layers expect.
pub fn reduce_with_normalization(
    data: ColumnData,
    method: DimReductionMethod,
    metric: MetricName,
    options: ReductionOptions,
    ctx: &EmbedContext,
) -> Result<ReductionOutcome> {
    let reducer = DimensionalityReducer::new(data, method, metric, options)?;
    let outcome = reducer.transform(ctx)?;
    Ok(match outcome {
        ReductionOutcome::Completed(mut result) => {
            let [mut xs, mut ys] = crate::types::transpose_embedding(&result.embedding);
            standardize_axis(&mut xs);
            standardize_axis(&mut ys);
            for (i, point) in result.embedding.iter_mut().enumerate() {
                *point = [xs[i], ys[i]];
            }
            ReductionOutcome::Completed(result)
        }
        cancelled => cancelled,
    })
}

/// Serializable request describing a whole reduction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductionRequest {
    pub data: ColumnData,
    pub method: DimReductionMethod,
    pub metric: MetricName,
    #[serde(default)]
    pub options: ReductionOptions,
}

/// Serializable worker response for a reduction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReductionResponse {
    Result(ReductionResult),
    Cancelled,
    Error(String),
}

/// Handle to a reduction running on a background thread. The pipeline is
/// exposed as a single asynchronous operation: spawn, then receive the
/// terminal outcome.
pub struct ReductionRunner {
    receiver: Receiver<ReductionResponse>,
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl ReductionRunner {
    /// Start the run on a worker thread.
    pub fn spawn(
        request: ReductionRequest,
        token: CancellationToken,
        progress: Option<SharedProgress>,
    ) -> Self {
        let (sender, receiver) = bounded(1);
        let ctx = EmbedContext {
            progress,
            cancellation: token.clone(),
            seed: request.options.seed,
        };
        let handle = std::thread::spawn(move || {
            let outcome = DimensionalityReducer::new(
                request.data,
                request.method,
                request.metric,
                request.options,
            )
            .and_then(|reducer| reducer.transform(&ctx));
            let response = match outcome {
                Ok(ReductionOutcome::Completed(result)) => ReductionResponse::Result(result),
                Ok(ReductionOutcome::Cancelled) => ReductionResponse::Cancelled,
                Err(e) => ReductionResponse::Error(e.to_string()),
            };
            let _ = sender.send(response);
        });
        Self {
            receiver,
            handle: Some(handle),
            token,
        }
    }

    /// Block until the run reaches a terminal state.
    pub fn wait(mut self) -> Result<ReductionOutcome> {
        let response = self
            .receiver
            .recv()
            .map_err(|_| SimError::internal("reduction worker disappeared"))?;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        match response {
            ReductionResponse::Result(result) => Ok(ReductionOutcome::Completed(result)),
            ReductionResponse::Cancelled => Ok(ReductionOutcome::Cancelled),
            ReductionResponse::Error(msg) => Err(SimError::internal(msg)),
        }
    }

    /// Request cancellation and release the worker.
    pub fn terminate(mut self) -> Result<ReductionOutcome> {
        self.token.cancel();
        let outcome = match self.receiver.recv() {
            Ok(ReductionResponse::Result(result)) => Ok(ReductionOutcome::Completed(result)),
            Ok(ReductionResponse::Cancelled) | Err(_) => Ok(ReductionOutcome::Cancelled),
            Ok(ReductionResponse::Error(msg)) => Err(SimError::internal(msg)),
        };
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }
}
