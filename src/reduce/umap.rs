//! UMAP embedding: k-nearest-neighbor graph, smoothed membership weights,
//! then stochastic gradient optimization with negative sampling.

use ordered_float::OrderedFloat;

use crate::config::UmapOptions;
use crate::error::Result;
use crate::reduce::{DistanceSource, EmbedContext, Embedder};
use crate::types::Embedding;
use crate::utils::random::RandomSampler;

const SMOOTH_KNN_STEPS: usize = 64;
const SMOOTH_KNN_TOLERANCE: f32 = 1e-5;
const CLIP: f32 = 4.0;

/// The neighbor count actually used for `n_items` points. Small inputs
/// (fewer than 15 points) always clamp to `n_items - 1`: the fuzzy graph
/// cannot ask for more neighbors than other points exist, and for inputs
/// this small the full neighborhood is the only sensible choice.
pub fn effective_neighbors(n_items: usize, configured: usize) -> usize {
    if n_items < 15 {
        n_items.saturating_sub(1)
    } else {
        configured
    }
}

pub(crate) struct UmapEmbedder {
    options: UmapOptions,
}

impl UmapEmbedder {
    pub(crate) fn new(options: UmapOptions) -> Self {
        Self { options }
    }
}

struct Edge {
    head: usize,
    tail: usize,
    epochs_per_sample: f32,
}

impl Embedder for UmapEmbedder {
    fn embed(&self, source: &DistanceSource<'_>, ctx: &EmbedContext) -> Result<Embedding> {
        let n = source.size();
        if n <= 1 {
            return Ok(vec![[0.0, 0.0]; n]);
        }

        let k = effective_neighbors(n, self.options.n_neighbors)
            .clamp(1, n - 1);

        ctx.check_cancelled()?;
        let knn = nearest_neighbors(source, k);
        let edges = fuzzy_edges(&knn);
        ctx.check_cancelled()?;

        let (a, b) = fit_ab(self.options.spread, self.options.min_dist);

        let total = if self.options.n_epochs > 0 {
            self.options.n_epochs
        } else if n > 10000 {
            200
        } else {
            500
        };

        let mut sampler = RandomSampler::from_optional_seed(ctx.seed);
        let mut y: Embedding = (0..n)
            .map(|_| {
                [
                    sampler.random_range(-10.0, 10.0),
                    sampler.random_range(-10.0, 10.0),
                ]
            })
            .collect();

        let mut next_sample: Vec<f32> = edges.iter().map(|e| e.epochs_per_sample).collect();

        for epoch in 0..total {
            ctx.check_cancelled()?;
            let alpha = self.options.learning_rate * (1.0 - epoch as f32 / total as f32);

            for (e, edge) in edges.iter().enumerate() {
                if next_sample[e] > (epoch + 1) as f32 {
                    continue;
                }
                next_sample[e] += edge.epochs_per_sample;

                attract(&mut y, edge.head, edge.tail, a, b, alpha);
                for _ in 0..self.options.negative_sample_rate {
                    let other = sampler.index(n);
                    if other != edge.head {
                        repulse(&mut y, edge.head, other, a, b, alpha);
                    }
                }
            }

            ctx.report(epoch + 1, total, &y);
        }

        Ok(y)
    }
}

fn attract(y: &mut [[f32; 2]], i: usize, j: usize, a: f32, b: f32, alpha: f32) {
    let dx = y[i][0] - y[j][0];
    let dy = y[i][1] - y[j][1];
    let d2 = dx * dx + dy * dy;
    if d2 <= 0.0 {
        return;
    }
    let coef = (-2.0 * a * b * d2.powf(b - 1.0)) / (1.0 + a * d2.powf(b));
    let gx = (coef * dx).clamp(-CLIP, CLIP) * alpha;
    let gy = (coef * dy).clamp(-CLIP, CLIP) * alpha;
    y[i][0] += gx;
    y[i][1] += gy;
    y[j][0] -= gx;
    y[j][1] -= gy;
}

fn repulse(y: &mut [[f32; 2]], i: usize, j: usize, a: f32, b: f32, alpha: f32) {
    let dx = y[i][0] - y[j][0];
    let dy = y[i][1] - y[j][1];
    let d2 = dx * dx + dy * dy;
    let coef = (2.0 * b) / ((0.001 + d2) * (1.0 + a * d2.powf(b)));
    let gx = (coef * dx).clamp(-CLIP, CLIP) * alpha;
    let gy = (coef * dy).clamp(-CLIP, CLIP) * alpha;
    y[i][0] += gx;
    y[i][1] += gy;
}

/// Brute-force k nearest neighbors per row, ascending by distance.
fn nearest_neighbors(source: &DistanceSource<'_>, k: usize) -> Vec<Vec<(usize, f32)>> {
    let n = source.size();
    let indices: Vec<usize> = (0..n).collect();
    crate::utils::parallel::maybe_parallel_map_threshold(&indices, 128, |&i| {
        let mut row: Vec<(usize, f32)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, source.get(i, j)))
            .collect();
        row.sort_by_key(|&(_, d)| OrderedFloat(d));
        row.truncate(k);
        row
    })
}

/// Convert kNN rows into a symmetrized weighted edge list with sampling
/// schedules (edges with higher membership are sampled more often).
fn fuzzy_edges(knn: &[Vec<(usize, f32)>]) -> Vec<Edge> {
    use std::collections::HashMap;

    let mut weights: HashMap<(usize, usize), (f32, f32)> = HashMap::new();
    for (i, row) in knn.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let rho = row
            .iter()
            .map(|&(_, d)| d)
            .filter(|&d| d > 0.0)
            .fold(f32::INFINITY, f32::min);
        let rho = if rho.is_finite() { rho } else { 0.0 };
        let sigma = smooth_knn_sigma(row, rho);

        for &(j, d) in row {
            let w = (-(d - rho).max(0.0) / sigma).exp();
            let key = (i.min(j), i.max(j));
            let entry = weights.entry(key).or_insert((0.0, 0.0));
            if i < j {
                entry.0 = w;
            } else {
                entry.1 = w;
            }
        }
    }

    let combined: Vec<((usize, usize), f32)> = weights
        .into_iter()
        .map(|(key, (w1, w2))| (key, w1 + w2 - w1 * w2))
        .filter(|&(_, w)| w > 0.0)
        .collect();
    let max_w = combined
        .iter()
        .map(|&(_, w)| w)
        .fold(0.0f32, f32::max)
        .max(f32::MIN_POSITIVE);

    combined
        .into_iter()
        .map(|((head, tail), w)| Edge {
            head,
            tail,
            epochs_per_sample: max_w / w,
        })
        .collect()
}

/// Binary search the bandwidth so the smoothed neighbor weights sum to
/// log2(k), the calibration UMAP uses to equalize local densities.
fn smooth_knn_sigma(row: &[(usize, f32)], rho: f32) -> f32 {
    let target = (row.len() as f32).log2().max(f32::MIN_POSITIVE);
    let mut lo = 0.0f32;
    let mut hi = f32::INFINITY;
    let mut sigma = 1.0f32;

    for _ in 0..SMOOTH_KNN_STEPS {
        let sum: f32 = row
            .iter()
            .map(|&(_, d)| (-(d - rho).max(0.0) / sigma).exp())
            .sum();
        if (sum - target).abs() < SMOOTH_KNN_TOLERANCE {
            break;
        }
        if sum > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            sigma = if hi.is_finite() { (lo + hi) / 2.0 } else { sigma * 2.0 };
        }
    }
    sigma.max(1e-3)
}

/// Fit the output-kernel parameters `a`, `b` so that `1/(1 + a d^(2b))`
/// approximates the target membership curve for the given spread and
/// minimum distance. Grid search over `b` with a closed-form least-squares
/// solve for `a` at each candidate.
fn fit_ab(spread: f32, min_dist: f32) -> (f32, f32) {
    let xs: Vec<f32> = (1..=100).map(|i| i as f32 * (3.0 * spread) / 100.0).collect();
    let target: Vec<f32> = xs
        .iter()
        .map(|&x| {
            if x <= min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let mut best = (1.577f32, 0.895f32);
    let mut best_err = f32::INFINITY;
    let mut b = 0.1f32;
    while b <= 2.5 {
        // least squares through the origin in u = d^(2b): 1/t - 1 = a * u
        let mut num = 0.0f32;
        let mut den = 0.0f32;
        for (&x, &t) in xs.iter().zip(&target) {
            let u = x.powf(2.0 * b);
            let v = 1.0 / t.max(1e-4) - 1.0;
            num += u * v;
            den += u * u;
        }
        let a = if den > 0.0 { (num / den).max(1e-3) } else { 1.0 };
        let err: f32 = xs
            .iter()
            .zip(&target)
            .map(|(&x, &t)| {
                let fitted = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (fitted - t) * (fitted - t)
            })
            .sum();
        if err < best_err {
            best_err = err;
            best = (a, b);
        }
        b += 0.02;
    }
    best
}
