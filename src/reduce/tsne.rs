//! t-SNE embedding over a precomputed distance structure.
//!
//! Classic formulation: per-row precision calibrated by binary search to a
//! target perplexity, symmetrized affinities, then gradient descent with
//! momentum and per-coordinate gains. The iteration count is the stopping
//! criterion; every step improves the objective but no convergence check
//! is performed.

use crate::config::TsneOptions;
use crate::error::Result;
use crate::reduce::{DistanceSource, EmbedContext, Embedder};
use crate::types::Embedding;
use crate::utils::random::RandomSampler;

const ENTROPY_SEARCH_STEPS: usize = 50;
const ENTROPY_TOLERANCE: f32 = 1e-4;
const MIN_PROBABILITY: f32 = 1e-12;

pub(crate) struct TsneEmbedder {
    options: TsneOptions,
}

impl TsneEmbedder {
    pub(crate) fn new(options: TsneOptions) -> Self {
        Self { options }
    }
}

impl Embedder for TsneEmbedder {
    fn embed(&self, source: &DistanceSource<'_>, ctx: &EmbedContext) -> Result<Embedding> {
        let n = source.size();
        if n <= 1 {
            return Ok(vec![[0.0, 0.0]; n]);
        }

        let p = symmetrized_affinities(source, self.options.perplexity);

        let mut sampler = RandomSampler::from_optional_seed(ctx.seed);
        let mut y: Embedding = (0..n)
            .map(|_| {
                [
                    sampler.random_range(-1e-4, 1e-4),
                    sampler.random_range(-1e-4, 1e-4),
                ]
            })
            .collect();
        let mut step = vec![[0.0f32; 2]; n];
        let mut gains = vec![[1.0f32; 2]; n];

        let total = self.options.iterations;
        let mut q_unnorm = vec![0.0f32; n * n];

        for iter in 0..total {
            ctx.check_cancelled()?;

            // student-t kernel over current coordinates
            let mut z_sum = 0.0f32;
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = y[i][0] - y[j][0];
                    let dy = y[i][1] - y[j][1];
                    let q = 1.0 / (1.0 + dx * dx + dy * dy);
                    q_unnorm[i * n + j] = q;
                    q_unnorm[j * n + i] = q;
                    z_sum += 2.0 * q;
                }
            }
            let z_sum = z_sum.max(MIN_PROBABILITY);

            // gradient of the KL divergence
            let momentum = if iter < 20 { 0.5 } else { 0.8 };
            for i in 0..n {
                let mut grad = [0.0f32; 2];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let qu = q_unnorm[i * n + j];
                    let q = (qu / z_sum).max(MIN_PROBABILITY);
                    let mult = 4.0 * (p[i * n + j] - q) * qu;
                    grad[0] += mult * (y[i][0] - y[j][0]);
                    grad[1] += mult * (y[i][1] - y[j][1]);
                }
                for d in 0..2 {
                    let same_sign = grad[d].signum() == step[i][d].signum();
                    gains[i][d] = if same_sign {
                        (gains[i][d] * 0.8).max(0.01)
                    } else {
                        gains[i][d] + 0.2
                    };
                    step[i][d] =
                        momentum * step[i][d] - self.options.epsilon * gains[i][d] * grad[d];
                    y[i][d] += step[i][d];
                }
            }

            // keep the solution centered
            let mut mean = [0.0f32; 2];
            for point in &y {
                mean[0] += point[0];
                mean[1] += point[1];
            }
            mean[0] /= n as f32;
            mean[1] /= n as f32;
            for point in y.iter_mut() {
                point[0] -= mean[0];
                point[1] -= mean[1];
            }

            ctx.report(iter + 1, total, &y);
        }

        Ok(y)
    }
}

/// Row-wise gaussian affinities calibrated to the target perplexity, then
/// symmetrized and normalized so that all entries sum to 1.
fn symmetrized_affinities(source: &DistanceSource<'_>, perplexity: f32) -> Vec<f32> {
    let n = source.size();
    // a row cannot spread over more neighbors than exist
    let target_entropy = perplexity.min((n - 1) as f32).max(1.0).ln();

    let mut conditional = vec![0.0f32; n * n];
    let mut row = vec![0.0f32; n];

    for i in 0..n {
        let mut beta = 1.0f32;
        let mut beta_min = f32::NEG_INFINITY;
        let mut beta_max = f32::INFINITY;

        for _ in 0..ENTROPY_SEARCH_STEPS {
            let mut sum = 0.0f32;
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = if j == i {
                    0.0
                } else {
                    (-source.get(i, j) * beta).exp()
                };
                sum += *slot;
            }

            let mut entropy = 0.0f32;
            if sum > 0.0 {
                for &v in row.iter() {
                    let pj = v / sum;
                    if pj > 1e-7 {
                        entropy -= pj * pj.ln();
                    }
                }
            }

            if (entropy - target_entropy).abs() < ENTROPY_TOLERANCE {
                break;
            }
            if entropy > target_entropy {
                // too spread out: sharpen the kernel
                beta_min = beta;
                beta = if beta_max.is_finite() {
                    (beta + beta_max) / 2.0
                } else {
                    beta * 2.0
                };
            } else {
                beta_max = beta;
                beta = if beta_min.is_finite() {
                    (beta + beta_min) / 2.0
                } else {
                    beta / 2.0
                };
            }
        }

        let sum: f32 = row.iter().sum::<f32>().max(MIN_PROBABILITY);
        for j in 0..n {
            conditional[i * n + j] = row[j] / sum;
        }
    }

    // p_ij = (p_{j|i} + p_{i|j}) / 2n, floored away from zero
    let mut p = vec![0.0f32; n * n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i * n + j] = ((conditional[i * n + j] + conditional[j * n + i])
                    / (2.0 * n as f32))
                    .max(MIN_PROBABILITY);
            }
        }
    }
    p
}
