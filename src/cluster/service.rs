//! Background clustering pipeline: sparse graph construction followed by
//! MCL, behind a serializable worker boundary.
//!
//! An accelerated backend, when supplied and enabled, is tried first; any
//! failure on that path is logged and recovered by the CPU path
//! unconditionally. Only a CPU-path failure surfaces to the caller.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver};
use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::cluster::mcl::{MclParams, MclReducer};
use crate::distance_matrix::sparse::{
    calc_sparse_multi_column, DistanceAggregationMethod, SparseMatrixResult,
};
use crate::error::{Result, SimError};
use crate::metrics::measure::{ColumnData, MetricOptions};
use crate::metrics::MetricName;

/// Alternative (e.g. GPU-resident) MCL implementation tried before the
/// CPU path.
pub trait AcceleratedMclBackend: Send + Sync {
    fn transform(
        &self,
        sparse: &SparseMatrixResult,
        item_count: usize,
        params: &MclParams,
    ) -> Result<Vec<u32>>;
}

/// Serializable request describing one clustering run. `threshold` is a
/// percentage in [0, 100], matching the UI contract; it is divided by 100
/// before thresholding similarities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub columns: Vec<ColumnData>,
    pub metrics: Vec<MetricName>,
    #[serde(default)]
    pub metric_options: Vec<MetricOptions>,
    pub threshold: f32,
    pub weights: Vec<f32>,
    #[serde(default)]
    pub aggregation: DistanceAggregationMethod,
    pub max_iterations: usize,
    #[serde(default)]
    pub use_accelerated: bool,
}

/// Serializable worker response for a clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterResponse {
    Result(Vec<u32>),
    Cancelled,
    Error(String),
}

/// Run the whole clustering pipeline on the calling thread: build the
/// sparse similarity graph, then cluster it.
pub fn cluster_request(
    request: &ClusterRequest,
    backend: Option<&dyn AcceleratedMclBackend>,
    token: &CancellationToken,
) -> Result<Vec<u32>> {
    let item_count = request.columns.first().map_or(0, |c| c.len());
    let sparse = calc_sparse_multi_column(
        &request.columns,
        &request.metrics,
        request.threshold / 100.0,
        &request.metric_options,
        &request.weights,
        request.aggregation,
        token,
    )?;
    token.check()?;

    let params = MclParams::new().with_max_iterations(request.max_iterations.max(1));

    if request.use_accelerated {
        if let Some(backend) = backend {
            match backend.transform(&sparse, item_count, &params) {
                Ok(labels) => return Ok(labels),
                Err(e) => {
                    // never propagate: the CPU path decides the outcome
                    tracing::error!(
                        error = %e,
                        "accelerated MCL failed, falling back to CPU implementation"
                    );
                }
            }
        }
    }

    MclReducer::new(params).transform(&sparse, item_count, token)
}

/// Handle to a clustering run on a background worker thread.
pub struct ClusterService {
    receiver: Receiver<ClusterResponse>,
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl ClusterService {
    /// Start the run on a worker thread.
    pub fn spawn(
        request: ClusterRequest,
        token: CancellationToken,
        backend: Option<Arc<dyn AcceleratedMclBackend>>,
    ) -> Self {
        let (sender, receiver) = bounded(1);
        let worker_token = token.clone();
        let handle = std::thread::spawn(move || {
            let outcome = cluster_request(&request, backend.as_deref(), &worker_token);
            let response = match outcome {
                Ok(labels) => ClusterResponse::Result(labels),
                Err(e) if e.is_cancelled() => ClusterResponse::Cancelled,
                Err(e) => ClusterResponse::Error(e.to_string()),
            };
            let _ = sender.send(response);
        });
        Self {
            receiver,
            handle: Some(handle),
            token,
        }
    }

    /// Block until the run finishes and return the cluster labels.
    pub fn wait(mut self) -> Result<Vec<u32>> {
        let response = self
            .receiver
            .recv()
            .map_err(|_| SimError::internal("cluster worker disappeared"))?;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        match response {
            ClusterResponse::Result(labels) => Ok(labels),
            ClusterResponse::Cancelled => Err(SimError::cancelled()),
            ClusterResponse::Error(msg) => Err(SimError::internal(msg)),
        }
    }

    /// Cancel the run and release the worker.
    pub fn terminate(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        tracing::debug!("cluster worker terminated");
    }
}
