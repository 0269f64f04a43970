//! Diverse subset selection.

use crate::utils::random::RandomSampler;

/// Pick `n` mutually distant items out of `length` using MaxMin: start from
/// a random item, then repeatedly add the candidate whose minimum distance
/// to the picked set is largest.
pub fn diverse_subset(
    length: usize,
    n: usize,
    dist: impl Fn(usize, usize) -> f32,
    seed: Option<u64>,
) -> Vec<usize> {
    if length == 0 || n == 0 {
        return Vec::new();
    }
    let n = n.min(length);

    let mut sampler = RandomSampler::from_optional_seed(seed);
    let mut subset = vec![sampler.index(length)];
    let mut complement: Vec<usize> = (0..length).filter(|i| *i != subset[0]).collect();

    while subset.len() < n {
        let (best_pos, _) = complement
            .iter()
            .enumerate()
            .map(|(pos, &candidate)| {
                let min_dist = subset
                    .iter()
                    .map(|&picked| dist(candidate, picked))
                    .fold(f32::INFINITY, f32::min);
                (pos, min_dist)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .expect("complement is non-empty while subset is short");
        subset.push(complement.swap_remove(best_pos));
    }
    subset
}
