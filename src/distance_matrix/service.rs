//! Background distance-matrix computation.
//!
//! The build is offloaded to a worker thread behind a serializable
//! request/response pair, so the caller's control flow is never blocked
//! while the O(N^2) computation runs. Workers fill disjoint positions of
//! the flat result, are joined before the matrix is considered complete,
//! and are torn down on cancellation.

use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver};
use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::distance_matrix::DistanceMatrix;
use crate::error::{Result, SimError};
use crate::metrics::measure::{ColumnData, Measure, MetricOptions};
use crate::metrics::MetricName;

/// Serializable request crossing the worker boundary: data plus metric
/// identity and arguments, no function references or live handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrixRequest {
    pub data: ColumnData,
    pub metric: MetricName,
    #[serde(default)]
    pub metric_options: MetricOptions,
    /// Divide the result by its maximum before returning.
    #[serde(default)]
    pub normalize: bool,
}

/// Serializable worker response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DistanceMatrixResponse {
    Result { data: Vec<f32>, size: usize },
    Cancelled,
    Error(String),
}

/// Compute a distance matrix for a request on the calling thread.
pub fn compute_request(
    request: &DistanceMatrixRequest,
    token: &CancellationToken,
) -> Result<DistanceMatrix> {
    let measure = Measure::new(request.metric);
    let f = measure.bind(&request.data, &request.metric_options)?;
    let mut matrix =
        DistanceMatrix::compute_pairs_cancellable(request.data.len(), |i, j| f(i, j), token)?;
    if request.normalize {
        matrix.normalize();
    }
    Ok(matrix)
}

/// Handle to an in-flight background distance-matrix build.
pub struct DistanceMatrixService {
    receiver: Receiver<DistanceMatrixResponse>,
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl DistanceMatrixService {
    /// Spawn the build on a worker thread.
    pub fn spawn(request: DistanceMatrixRequest, token: CancellationToken) -> Self {
        let (sender, receiver) = bounded(1);
        let worker_token = token.clone();
        let handle = std::thread::spawn(move || {
            let response = match compute_request(&request, &worker_token) {
                Ok(matrix) => DistanceMatrixResponse::Result {
                    size: matrix.size(),
                    data: matrix.into_data(),
                },
                Err(e) if e.is_cancelled() => DistanceMatrixResponse::Cancelled,
                Err(e) => DistanceMatrixResponse::Error(e.to_string()),
            };
            // receiver may already be gone after terminate()
            let _ = sender.send(response);
        });
        Self {
            receiver,
            handle: Some(handle),
            token,
        }
    }

    /// Block until the worker finishes and return its matrix.
    pub fn wait(mut self) -> Result<DistanceMatrix> {
        let response = self
            .receiver
            .recv()
            .map_err(|_| SimError::internal("distance matrix worker disappeared"))?;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        match response {
            DistanceMatrixResponse::Result { data, size } => DistanceMatrix::from_data(data, size),
            DistanceMatrixResponse::Cancelled => Err(SimError::cancelled()),
            DistanceMatrixResponse::Error(msg) => Err(SimError::internal(msg)),
        }
    }

    /// Cancel the build and release the worker.
    pub fn terminate(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        tracing::debug!("distance matrix worker terminated");
    }
}
