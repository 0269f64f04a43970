//! Configuration types for reduction runs.
//!
//! Options are plain serializable data with builder-style setters, so a
//! whole run can be described by a message crossing the worker boundary.

use serde::{Deserialize, Serialize};

use crate::metrics::measure::MetricOptions;

/// Options for the UMAP embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UmapOptions {
    /// Initial learning rate for the embedding optimization.
    pub learning_rate: f32,

    /// Number of SGD epochs; 0 means choose automatically from the data
    /// size.
    pub n_epochs: usize,

    /// Number of nearest neighbors used to build the fuzzy graph.
    /// Clamped to N-1 for small inputs (N < 15).
    pub n_neighbors: usize,

    /// Effective scale of embedded points.
    pub spread: f32,

    /// Minimum distance between embedded points.
    pub min_dist: f32,

    /// Negative samples drawn per positive edge and epoch.
    pub negative_sample_rate: usize,
}

impl Default for UmapOptions {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            n_epochs: 0,
            n_neighbors: 15,
            spread: 1.0,
            min_dist: 0.1,
            negative_sample_rate: 5,
        }
    }
}

impl UmapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_neighbors(mut self, n: usize) -> Self {
        self.n_neighbors = n;
        self
    }

    pub fn with_n_epochs(mut self, epochs: usize) -> Self {
        self.n_epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_min_dist(mut self, min_dist: f32) -> Self {
        self.min_dist = min_dist;
        self
    }
}

/// Options for the t-SNE embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsneOptions {
    /// Learning rate (epsilon).
    pub epsilon: f32,

    /// Roughly how many neighbors each point influences.
    pub perplexity: f32,

    /// Gradient-descent iterations. The iteration count is the stopping
    /// criterion; no convergence check is performed.
    pub iterations: usize,
}

impl Default for TsneOptions {
    fn default() -> Self {
        Self {
            epsilon: 10.0,
            perplexity: 30.0,
            iterations: 100,
        }
    }
}

impl TsneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_perplexity(mut self, perplexity: f32) -> Self {
        self.perplexity = perplexity;
        self
    }
}

/// Options for the stochastic proximity embedding family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeOptions {
    /// Update cycles; 0 means choose automatically from the data size.
    pub cycles: usize,

    /// Initial learning rate.
    pub lambda: f32,

    /// Final learning rate after the linear decay.
    pub lambda_min: f32,

    /// Neighborhood cutoff for the original SPE variant; pairs with a
    /// target distance above the cutoff are only pushed apart when they
    /// are too close. 0 disables the cutoff.
    pub cutoff: f32,
}

impl Default for SpeOptions {
    fn default() -> Self {
        Self {
            cycles: 0,
            lambda: 2.0,
            lambda_min: 0.01,
            cutoff: 0.0,
        }
    }
}

impl SpeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff;
        self
    }
}

/// Options for one dimensionality-reduction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReductionOptions {
    /// Iteration/epoch override applied to the chosen method
    /// (t-SNE iterations, UMAP epochs, SPE cycles).
    pub cycles: Option<usize>,

    /// Materialize the full distance matrix even above the row cap.
    pub precompute_distance_matrix: bool,

    /// Build the distance matrix with parallel workers.
    pub parallel_distance: bool,

    /// Keep the (normalized) distance matrix in the result for reuse.
    pub keep_distance_matrix: bool,

    /// Seed for reproducible embeddings.
    pub seed: Option<u64>,

    /// Metric construction options (macromolecule alignment parameters).
    pub metric_options: MetricOptions,

    pub umap: UmapOptions,
    pub tsne: TsneOptions,
    pub spe: SpeOptions,
}

impl ReductionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = Some(cycles);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_precomputed_distance_matrix(mut self) -> Self {
        self.precompute_distance_matrix = true;
        self
    }

    pub fn with_parallel_distance(mut self) -> Self {
        self.parallel_distance = true;
        self
    }

    pub fn with_kept_distance_matrix(mut self) -> Self {
        self.keep_distance_matrix = true;
        self
    }

    pub fn with_umap(mut self, umap: UmapOptions) -> Self {
        self.umap = umap;
        self
    }

    pub fn with_tsne(mut self, tsne: TsneOptions) -> Self {
        self.tsne = tsne;
        self
    }

    pub fn with_spe(mut self, spe: SpeOptions) -> Self {
        self.spe = spe;
        self
    }

    pub fn with_metric_options(mut self, metric_options: MetricOptions) -> Self {
        self.metric_options = metric_options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ReductionOptions::default();
        assert_eq!(opts.tsne.iterations, 100);
        assert_eq!(opts.umap.n_neighbors, 15);
        assert!(!opts.precompute_distance_matrix);
    }

    #[test]
    fn test_builder_chain() {
        let opts = ReductionOptions::new()
            .with_cycles(250)
            .with_seed(42)
            .with_precomputed_distance_matrix()
            .with_umap(UmapOptions::new().with_n_neighbors(5));
        assert_eq!(opts.cycles, Some(250));
        assert_eq!(opts.seed, Some(42));
        assert!(opts.precompute_distance_matrix);
        assert_eq!(opts.umap.n_neighbors, 5);
    }

    #[test]
    fn test_options_serialize_roundtrip() {
        let opts = ReductionOptions::new().with_cycles(10).with_seed(7);
        let json = serde_json::to_string(&opts).unwrap();
        let back: ReductionOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cycles, Some(10));
        assert_eq!(back.seed, Some(7));
    }
}
