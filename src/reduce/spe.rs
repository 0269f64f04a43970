//! Stochastic proximity embedding.
//!
//! Three variants of the same refinement idea: repeatedly pick points,
//! compare their current 2-D separation against the target distance, and
//! nudge coordinates toward the target under a linearly decaying learning
//! rate.
//!
//! - `Base` updates one random pair per cycle;
//! - `Pivot` picks one pivot per cycle and updates every other point
//!   against it;
//! - `Original` is the pair variant with a neighborhood cutoff: far pairs
//!   are only corrected when they sit closer than their target.

use serde::{Deserialize, Serialize};

use crate::config::SpeOptions;
use crate::error::Result;
use crate::reduce::{DistanceSource, EmbedContext, Embedder};
use crate::types::Embedding;
use crate::utils::random::RandomSampler;

const EPSILON: f32 = 1e-9;

/// Which update schedule the embedder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeVariant {
    Base,
    Pivot,
    Original,
}

pub(crate) struct SpeEmbedder {
    options: SpeOptions,
    variant: SpeVariant,
}

impl SpeEmbedder {
    pub(crate) fn new(options: SpeOptions, variant: SpeVariant) -> Self {
        Self { options, variant }
    }

    fn default_cycles(&self, n: usize) -> usize {
        match self.variant {
            // one pair per cycle: scale the update count with the input
            SpeVariant::Base | SpeVariant::Original => (50 * n).clamp(10_000, 1_000_000),
            // one full sweep per cycle
            SpeVariant::Pivot => 500,
        }
    }
}

impl Embedder for SpeEmbedder {
    fn embed(&self, source: &DistanceSource<'_>, ctx: &EmbedContext) -> Result<Embedding> {
        let n = source.size();
        if n <= 1 {
            return Ok(vec![[0.0, 0.0]; n]);
        }

        let cycles = if self.options.cycles > 0 {
            self.options.cycles
        } else {
            self.default_cycles(n)
        };
        let lambda0 = self.options.lambda;
        let lambda_min = self.options.lambda_min;

        let mut sampler = RandomSampler::from_optional_seed(ctx.seed);
        let mut y: Embedding = (0..n)
            .map(|_| [sampler.random_f32(), sampler.random_f32()])
            .collect();

        let report_every = (cycles / 100).max(1);

        for cycle in 0..cycles {
            if cycle % report_every == 0 {
                ctx.check_cancelled()?;
            }
            let lambda =
                lambda0 - (lambda0 - lambda_min) * cycle as f32 / cycles as f32;

            match self.variant {
                SpeVariant::Base => {
                    let (i, j) = sampler.distinct_pair(n);
                    update_pair(&mut y, i, j, source.get(i, j), lambda, false, 0.0);
                }
                SpeVariant::Original => {
                    let (i, j) = sampler.distinct_pair(n);
                    update_pair(
                        &mut y,
                        i,
                        j,
                        source.get(i, j),
                        lambda,
                        self.options.cutoff > 0.0,
                        self.options.cutoff,
                    );
                }
                SpeVariant::Pivot => {
                    let pivot = sampler.index(n);
                    for j in 0..n {
                        if j != pivot {
                            update_point(&mut y, j, pivot, source.get(pivot, j), lambda);
                        }
                    }
                }
            }

            if (cycle + 1) % report_every == 0 || cycle + 1 == cycles {
                ctx.report(cycle + 1, cycles, &y);
            }
        }

        Ok(y)
    }
}

/// Move both endpoints of a pair half-way each toward their target
/// separation.
fn update_pair(
    y: &mut [[f32; 2]],
    i: usize,
    j: usize,
    target: f32,
    lambda: f32,
    use_cutoff: bool,
    cutoff: f32,
) {
    if !target.is_finite() {
        return;
    }
    let dx = y[i][0] - y[j][0];
    let dy = y[i][1] - y[j][1];
    let current = (dx * dx + dy * dy).sqrt();
    // far pairs outside the cutoff are only pushed apart when too close
    if use_cutoff && target > cutoff && current >= target {
        return;
    }
    let coef = 0.5 * lambda * (target - current) / (current + EPSILON);
    y[i][0] += coef * dx;
    y[i][1] += coef * dy;
    y[j][0] -= coef * dx;
    y[j][1] -= coef * dy;
}

/// Move a single point toward its target separation from a fixed pivot.
fn update_point(y: &mut [[f32; 2]], j: usize, pivot: usize, target: f32, lambda: f32) {
    if !target.is_finite() {
        return;
    }
    let dx = y[j][0] - y[pivot][0];
    let dy = y[j][1] - y[pivot][1];
    let current = (dx * dx + dy * dy).sqrt();
    let coef = lambda * (target - current) / (current + EPSILON);
    y[j][0] += coef * dx;
    y[j][1] += coef * dy;
}
