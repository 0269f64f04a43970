//! Set-similarity coefficients over pairs of equal-length bit vectors.
//!
//! Every coefficient is expressed through three counts: `cx = x.true_count()`,
//! `cy = y.true_count()` and `common = x.and_count(y)`. Similarity and
//! distance are dual views of the same coefficient: a similarity-named metric
//! derives its distance as `1/s - 1`, while the naturally-distance metrics
//! (Hamming, Euclidean) derive a similarity as `1/(1 + d)`.
//!
//! Degenerate inputs (zero popcounts, zero length) return the documented
//! constants instead of NaN, with one deliberate exception: Sokal carries no
//! zero-denominator guard, matching the behavior similarity searches have
//! relied on so far (two all-zero vectors yield NaN).

use crate::bit_vector::BitVector;

/// Derive a similarity from a distance: `1 / (1 + d)`.
#[inline]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Derive a distance from a similarity: `1 / s - 1`.
#[inline]
pub fn distance_from_similarity(similarity: f32) -> f32 {
    1.0 / similarity - 1.0
}

/// Tanimoto (Jaccard) similarity: `common / (cx + cy - common)`.
/// Two vectors with no set bits at all are considered identical (1.0).
pub fn tanimoto_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() + y.true_count()) as f32;
    if total == 0.0 {
        return 1.0;
    }
    let common = x.and_count(y) as f32;
    common / (total - common)
}

pub fn tanimoto_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(tanimoto_similarity(x, y))
}

/// Dice similarity: `2 * common / (cx + cy)`; 0.0 when no bits are set.
pub fn dice_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() + y.true_count()) as f32;
    if total == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    2.0 * common / total
}

pub fn dice_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(dice_similarity(x, y))
}

/// Cosine similarity: `common / sqrt(cx * cy)`; 0.0 when either side is empty.
pub fn cosine_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() * y.true_count()) as f32;
    if total == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    common / total.sqrt()
}

pub fn cosine_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(cosine_similarity(x, y))
}

/// Euclidean distance over set bits: `sqrt(cx + cy - 2 * common)`.
pub fn euclidean_distance(x: &BitVector, y: &BitVector) -> f32 {
    ((x.true_count() + y.true_count()) as f32 - 2.0 * x.and_count(y) as f32).sqrt()
}

pub fn euclidean_similarity(x: &BitVector, y: &BitVector) -> f32 {
    similarity_from_distance(euclidean_distance(x, y))
}

/// Hamming distance: the size of the symmetric difference,
/// `cx + cy - 2 * common`.
pub fn hamming_distance(x: &BitVector, y: &BitVector) -> f32 {
    (x.true_count() + y.true_count()) as f32 - 2.0 * x.and_count(y) as f32
}

pub fn hamming_similarity(x: &BitVector, y: &BitVector) -> f32 {
    similarity_from_distance(hamming_distance(x, y))
}

/// Sokal similarity: `common / (2 * (cx + cy) - 3 * common)`.
/// No zero-denominator guard (see module docs).
pub fn sokal_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() + y.true_count()) as f32;
    let common = x.and_count(y) as f32;
    common / (2.0 * total - 3.0 * common)
}

pub fn sokal_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(sokal_similarity(x, y))
}

/// Kulczynski similarity: `common * (cx + cy) / (2 * cx * cy)`;
/// 0.0 when either side is empty.
pub fn kulczynski_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() + y.true_count()) as f32;
    let total_prod = (x.true_count() * y.true_count()) as f32;
    if total_prod == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    (common * total) / (2.0 * total_prod)
}

pub fn kulczynski_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(kulczynski_similarity(x, y))
}

/// McConnaughey similarity: `(common * (cx + cy) - cx * cy) / (cx * cy)`;
/// 0.0 when either side is empty.
pub fn mcconnaughey_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let total = (x.true_count() + y.true_count()) as f32;
    let total_prod = (x.true_count() * y.true_count()) as f32;
    if total_prod == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    (common * total - total_prod) / total_prod
}

pub fn mcconnaughey_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(mcconnaughey_similarity(x, y))
}

/// Asymmetric (overlap) similarity: `common / min(cx, cy)`; 0.0 when the
/// smaller side is empty. The formula itself is symmetric in its arguments.
pub fn asymmetric_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let min = x.true_count().min(y.true_count()) as f32;
    if min == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    common / min
}

pub fn asymmetric_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(asymmetric_similarity(x, y))
}

/// Braun-Blanquet similarity: `common / max(cx, cy)`; 0.0 when both empty.
pub fn braun_blanquet_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let max = x.true_count().max(y.true_count()) as f32;
    if max == 0.0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    common / max
}

pub fn braun_blanquet_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(braun_blanquet_similarity(x, y))
}

/// Russel-Rao similarity: `common / len`; 0.0 for zero-length vectors.
pub fn russel_similarity(x: &BitVector, y: &BitVector) -> f32 {
    if x.len() == 0 {
        return 0.0;
    }
    let common = x.and_count(y) as f32;
    common / x.len() as f32
}

pub fn russel_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(russel_similarity(x, y))
}

/// Rogot-Goldberg similarity. Fully identical or fully complementary
/// bit patterns (w.r.t. set bits) score exactly 1.0; otherwise
/// `common / total + diff / (2 * len - total)` where
/// `diff = len - total + common` counts shared zero positions.
pub fn rogot_goldberg_similarity(x: &BitVector, y: &BitVector) -> f32 {
    let common = x.and_count(y) as f32;
    let total = (x.true_count() + y.true_count()) as f32;
    let len = x.len() as f32;
    let diff = len - total + common;
    if common == len || diff == len {
        1.0
    } else {
        common / total + diff / (2.0 * len - total)
    }
}

pub fn rogot_goldberg_distance(x: &BitVector, y: &BitVector) -> f32 {
    distance_from_similarity(rogot_goldberg_similarity(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(len: usize, bits: &[usize]) -> BitVector {
        BitVector::from_set_bits(len, bits)
    }

    #[test]
    fn test_identical_vectors() {
        // two identical vectors, 4 bits set, common = 4
        let x = fp(10, &[0, 2, 5, 7]);
        assert!((tanimoto_similarity(&x, &x) - 1.0).abs() < 1e-6);
        assert!((dice_similarity(&x, &x) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&x, &x) - 1.0).abs() < 1e-6);
        assert!(tanimoto_distance(&x, &x).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_vectors() {
        // cx = 3, cy = 5, common = 0
        let x = fp(16, &[0, 1, 2]);
        let y = fp(16, &[3, 4, 5, 6, 7]);
        assert_eq!(tanimoto_similarity(&x, &y), 0.0);
        assert_eq!(asymmetric_similarity(&x, &y), 0.0);
        assert_eq!(braun_blanquet_similarity(&x, &y), 0.0);
        assert_eq!(hamming_distance(&x, &y), 8.0);
    }

    #[test]
    fn test_all_zero_degenerate_constants() {
        // the degenerate rules differ between coefficients by design
        let x = BitVector::zeros(10);
        let y = BitVector::zeros(10);
        assert_eq!(tanimoto_similarity(&x, &y), 1.0);
        assert_eq!(dice_similarity(&x, &y), 0.0);
        assert_eq!(cosine_similarity(&x, &y), 0.0);
        assert_eq!(asymmetric_similarity(&x, &y), 0.0);
        assert_eq!(braun_blanquet_similarity(&x, &y), 0.0);
        assert_eq!(kulczynski_similarity(&x, &y), 0.0);
        assert_eq!(mcconnaughey_similarity(&x, &y), 0.0);
        assert_eq!(russel_similarity(&x, &y), 0.0);
    }

    #[test]
    fn test_sokal_no_guard() {
        // pinned: Sokal on two all-zero vectors yields NaN (0/0)
        let x = BitVector::zeros(10);
        assert!(sokal_similarity(&x, &x).is_nan());
    }

    #[test]
    fn test_zero_length_russel() {
        let x = BitVector::zeros(0);
        assert_eq!(russel_similarity(&x, &x), 0.0);
    }

    #[test]
    fn test_rogot_goldberg_special_cases() {
        let ones = fp(8, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(rogot_goldberg_similarity(&ones, &ones), 1.0);
        // fully complementary set-bit patterns
        let x = fp(8, &[0, 1, 2, 3]);
        let y = fp(8, &[4, 5, 6, 7]);
        assert_eq!(rogot_goldberg_similarity(&x, &y), 1.0);
    }

    #[test]
    fn test_rogot_goldberg_general() {
        let x = fp(8, &[0, 1, 2]);
        let y = fp(8, &[1, 2, 3]);
        // common = 2, total = 6, diff = 8 - 6 + 2 = 4
        let expected = 2.0 / 6.0 + 4.0 / (16.0 - 6.0);
        assert!((rogot_goldberg_similarity(&x, &y) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_similarity_duality() {
        let x = fp(32, &[0, 3, 9, 14, 20]);
        let y = fp(32, &[0, 3, 10, 14, 21, 30]);
        let pairs: [(fn(&BitVector, &BitVector) -> f32, fn(&BitVector, &BitVector) -> f32); 8] = [
            (tanimoto_similarity, tanimoto_distance),
            (dice_similarity, dice_distance),
            (cosine_similarity, cosine_distance),
            (asymmetric_similarity, asymmetric_distance),
            (braun_blanquet_similarity, braun_blanquet_distance),
            (kulczynski_similarity, kulczynski_distance),
            (russel_similarity, russel_distance),
            (sokal_similarity, sokal_distance),
        ];
        for (sim, dist) in pairs {
            let s = sim(&x, &y);
            let d = dist(&x, &y);
            assert!((d - (1.0 / s - 1.0)).abs() < 1e-5);
        }
        // Hamming/Euclidean run the inversion the other way
        let d = hamming_distance(&x, &y);
        assert!((hamming_similarity(&x, &y) - 1.0 / (1.0 + d)).abs() < 1e-6);
        let d = euclidean_distance(&x, &y);
        assert!((euclidean_similarity(&x, &y) - 1.0 / (1.0 + d)).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let x = fp(64, &[1, 5, 17, 33, 60]);
        let y = fp(64, &[2, 5, 18, 33, 61, 62]);
        let fns: [fn(&BitVector, &BitVector) -> f32; 12] = [
            tanimoto_similarity,
            dice_similarity,
            cosine_similarity,
            asymmetric_similarity,
            braun_blanquet_similarity,
            kulczynski_similarity,
            mcconnaughey_similarity,
            rogot_goldberg_similarity,
            russel_similarity,
            sokal_similarity,
            hamming_distance,
            euclidean_distance,
        ];
        for f in fns {
            assert_eq!(f(&x, &y), f(&y, &x));
        }
    }

    #[test]
    fn test_euclidean_is_sqrt_of_hamming() {
        let x = fp(16, &[0, 1, 2, 3]);
        let y = fp(16, &[2, 3, 4, 5]);
        assert!((euclidean_distance(&x, &y) - hamming_distance(&x, &y).sqrt()).abs() < 1e-6);
    }
}
