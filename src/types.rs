//! Core type definitions for simspace.

use std::sync::Arc;

/// A 2-D embedding: one (x, y) pair per input item, in input order.
pub type Embedding = Vec<[f32; 2]>;

/// Progress sink invoked between embedding iterations with
/// `(epoch, total_epochs, current_snapshot)`. Purely observational;
/// the pipeline never waits on it.
pub type ProgressFn = dyn Fn(usize, usize, &[[f32; 2]]) + Send + Sync;

/// Shared handle to a progress sink.
pub type SharedProgress = Arc<ProgressFn>;

/// Convert an embedding into two parallel axis arrays (all x, then all y).
pub fn transpose_embedding(embedding: &[[f32; 2]]) -> [Vec<f32>; 2] {
    let xs = embedding.iter().map(|p| p[0]).collect();
    let ys = embedding.iter().map(|p| p[1]).collect();
    [xs, ys]
}

/// Standardize one coordinate axis in place to zero mean and unit variance.
/// Degenerate axes (zero spread) are centered only.
pub fn standardize_axis(values: &mut [f32]) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let mean = values.iter().sum::<f32>() / n as f32;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n as f32;
    let std = var.sqrt();
    for v in values.iter_mut() {
        *v = if std > 0.0 { (*v - mean) / std } else { *v - mean };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_embedding() {
        let emb = vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let [xs, ys] = transpose_embedding(&emb);
        assert_eq!(xs, vec![1.0, 3.0, 5.0]);
        assert_eq!(ys, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_standardize_axis() {
        let mut values = vec![1.0, 2.0, 3.0];
        standardize_axis(&mut values);
        let mean: f32 = values.iter().sum::<f32>() / 3.0;
        assert!(mean.abs() < 1e-6);
        let var: f32 = values.iter().map(|v| v * v).sum::<f32>() / 3.0;
        assert!((var - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_standardize_degenerate_axis() {
        let mut values = vec![2.0, 2.0, 2.0];
        standardize_axis(&mut values);
        assert!(values.iter().all(|v| v.abs() < 1e-6));
    }
}
