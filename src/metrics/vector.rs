//! Distance metrics over real-valued vectors.

use num_traits::Float;

/// Euclidean (L2) distance between two equal-length vectors.
#[inline]
pub fn euclidean_distance<T: Float>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len(), "vectors must have equal length");
    let mut sum = T::zero();
    for (&x, &y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        sum = sum + diff * diff;
    }
    sum.sqrt()
}

/// Euclidean distance specialized to `f32` slices (the registry's form).
#[inline]
pub fn euclidean_distance_f32(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0f32, 0.0, 0.0];
        let b = [3.0f32, 4.0, 0.0];
        assert!((euclidean_distance_f32(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_self_distance() {
        let a = [1.5f32, -2.0, 7.25];
        assert_eq!(euclidean_distance_f32(&a, &a), 0.0);
    }

    #[test]
    fn test_euclidean_f64() {
        let a = [0.0f64, 0.0];
        let b = [1.0f64, 1.0];
        assert!((euclidean_distance(&a, &b) - 2.0f64.sqrt()).abs() < 1e-12);
    }
}
