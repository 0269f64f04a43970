//! Parametrized distance functions for macromolecule sequences.
//!
//! Unlike the other metric buckets these need construction-time options
//! (substitution matrix, gap penalties), so each metric is a factory
//! returning a bound distance function. All three distances are
//! normalized so that 0 means identical; Needleman-Wunsch values may
//! exceed 1 for strongly penalized alignments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::string::levenshtein_chars;

/// A bound macromolecule distance function.
pub type MmDistanceFn = Box<dyn Fn(&str, &str) -> f32 + Send + Sync>;

// BLOSUM62 substitution matrix for protein sequences.
const BLOSUM62: [[i32; 24]; 24] = [
    [4, -1, -2, -2, 0, -1, -1, 0, -2, -1, -1, -1, -1, -2, -1, 1, 0, -3, -2, 0, -2, -1, 0, -4],
    [-1, 5, 0, -2, -3, 1, 0, -2, 0, -3, -2, 2, -1, -3, -2, -1, -1, -3, -2, -3, -1, 0, -1, -4],
    [-2, 0, 6, 1, -3, 0, 0, 0, 1, -3, -3, 0, -2, -3, -2, 1, 0, -4, -2, -3, 3, 0, -1, -4],
    [-2, -2, 1, 6, -3, 0, 2, -1, -1, -3, -4, -1, -3, -3, -1, 0, -1, -4, -3, -3, 4, 1, -1, -4],
    [0, -3, -3, -3, 9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4],
    [-1, 1, 0, 0, -3, 5, 2, -2, 0, -3, -2, 1, 0, -3, -1, 0, -1, -2, -1, -2, 0, 3, -1, -4],
    [-1, 0, 0, 2, -4, 2, 5, -2, 0, -3, -3, 1, -2, -3, -1, 0, -1, -3, -2, -2, 1, 4, -1, -4],
    [0, -2, 0, -1, -3, -2, -2, 6, -2, -4, -4, -2, -3, -3, -2, 0, -2, -2, -3, -3, -1, -2, -1, -4],
    [-2, 0, 1, -1, -3, 0, 0, -2, 8, -3, -3, -1, -2, -1, -2, -1, -2, -2, 2, -3, 0, 0, -1, -4],
    [-1, -3, -3, -3, -1, -3, -3, -4, -3, 4, 2, -3, 1, 0, -3, -2, -1, -3, -1, 3, -3, -3, -1, -4],
    [-1, -2, -3, -4, -1, -2, -3, -4, -3, 2, 4, -2, 2, 0, -3, -2, -1, -2, -1, 1, -4, -3, -1, -4],
    [-1, 2, 0, -1, -3, 1, 1, -2, -1, -3, -2, 5, -1, -3, -1, 0, -1, -3, -2, -2, 0, 1, -1, -4],
    [-1, -1, -2, -3, -1, 0, -2, -3, -2, 1, 2, -1, 5, 0, -2, -1, -1, -1, -1, 1, -3, -1, -1, -4],
    [-2, -3, -3, -3, -2, -3, -3, -3, -1, 0, 0, -3, 0, 6, -4, -2, -2, 1, 3, -1, -3, -3, -1, -4],
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4, 7, -1, -1, -4, -3, -2, -2, -1, -2, -4],
    [1, -1, 1, 0, -1, 0, 0, 0, -1, -2, -2, 0, -1, -2, -1, 4, 1, -3, -2, -2, 0, 0, 0, -4],
    [0, -1, 0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1, 1, 5, -2, -2, 0, -1, -1, 0, -4],
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1, 1, -4, -3, -2, 11, 2, -3, -4, -3, -2, -4],
    [-2, -2, -2, -3, -2, -1, -2, -3, 2, -1, -1, -2, -1, 3, -3, -2, -2, 2, 7, -1, -3, -2, -1, -4],
    [0, -3, -3, -3, -1, -2, -2, -3, -3, 3, 1, -2, 1, -1, -2, -2, 0, -3, -1, 4, -3, -2, -1, -4],
    [-2, -1, 3, 4, -3, 0, 1, -1, 0, -3, -4, 0, -3, -3, -2, 0, -1, -4, -3, -3, 4, 1, -1, -4],
    [-1, 0, 0, 1, -3, 3, 4, -2, 0, -3, -3, 1, -1, -3, -1, 0, -1, -3, -2, -2, 1, 4, -1, -4],
    [0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2, 0, 0, -2, -1, -1, -1, -1, -1, -4],
    [-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, 1],
];

fn protein_indexes() -> HashMap<char, usize> {
    "ARNDCQEGHILKMFPSTWYVBZX*"
        .chars()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect()
}

/// Options for the Needleman-Wunsch distance. Defaults to BLOSUM62 with
/// the protein alphabet, gap open 8 and gap extend 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedlemanWunschOptions {
    pub gap_open: f32,
    pub gap_extend: f32,
    pub scoring_matrix: Vec<Vec<f32>>,
    pub alphabet_indexes: HashMap<char, usize>,
}

impl Default for NeedlemanWunschOptions {
    fn default() -> Self {
        Self {
            gap_open: 8.0,
            gap_extend: 2.0,
            scoring_matrix: BLOSUM62
                .iter()
                .map(|row| row.iter().map(|&v| v as f32).collect())
                .collect(),
            alphabet_indexes: protein_indexes(),
        }
    }
}

impl NeedlemanWunschOptions {
    // Characters missing from the alphabet score 0.
    fn score(&self, a: char, b: char) -> f32 {
        match (self.alphabet_indexes.get(&a), self.alphabet_indexes.get(&b)) {
            (Some(&i), Some(&j)) => self.scoring_matrix[i][j],
            _ => 0.0,
        }
    }

    fn self_score(&self, s: &[char]) -> f32 {
        s.iter().map(|&c| self.score(c, c)).sum()
    }
}

/// Hamming distance factory: positional mismatches over the shared prefix
/// plus the length difference, normalized by the longer length.
pub fn mm_hamming_distance() -> MmDistanceFn {
    Box::new(|s1: &str, s2: &str| {
        let a: Vec<char> = s1.chars().collect();
        let b: Vec<char> = s2.chars().collect();
        let max_len = a.len().max(b.len());
        if max_len == 0 {
            return 0.0;
        }
        let mismatches = a
            .iter()
            .zip(b.iter())
            .filter(|(x, y)| x != y)
            .count()
            + a.len().abs_diff(b.len());
        mismatches as f32 / max_len as f32
    })
}

/// Levenshtein distance factory: edit distance normalized by the longer
/// length.
pub fn mm_levenshtein_distance() -> MmDistanceFn {
    Box::new(|s1: &str, s2: &str| {
        let a: Vec<char> = s1.chars().collect();
        let b: Vec<char> = s2.chars().collect();
        let max_len = a.len().max(b.len());
        if max_len == 0 {
            return 0.0;
        }
        levenshtein_chars(&a, &b) as f32 / max_len as f32
    })
}

/// Needleman-Wunsch distance factory: affine-gap global alignment scored
/// against the substitution matrix, converted to a distance as
/// `1 - score / max(self_score(a), self_score(b))`.
pub fn needleman_wunsch_distance(opts: NeedlemanWunschOptions) -> MmDistanceFn {
    Box::new(move |s1: &str, s2: &str| {
        let a: Vec<char> = s1.chars().collect();
        let b: Vec<char> = s2.chars().collect();
        let denom = opts.self_score(&a).max(opts.self_score(&b));
        if denom <= 0.0 {
            // no alignable content to normalize against
            return if a == b { 0.0 } else { 1.0 };
        }
        1.0 - nw_score(&a, &b, &opts) / denom
    })
}

/// Global alignment score with affine gaps. Only the last two DP rows are
/// kept; per-column gap flags decide between open and extend penalties.
fn nw_score(seq1: &[char], seq2: &[char], opts: &NeedlemanWunschOptions) -> f32 {
    let n = seq1.len();
    let mut prev = vec![0.0f32; n + 1];
    let mut curr = vec![0.0f32; n + 1];
    let mut vertical_gaps = vec![false; n + 1];
    let mut horizontal_gaps = vec![false; n + 1];

    // leading gap of length L costs gap_open + (L-1) * gap_extend
    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = if i == 0 {
            0.0
        } else {
            -opts.gap_open - (i as f32 - 1.0) * opts.gap_extend
        };
    }

    for (i, &cb) in seq2.iter().enumerate() {
        curr[0] = -opts.gap_open - i as f32 * opts.gap_extend;
        for (j, &ca) in seq1.iter().enumerate() {
            let diagonal = prev[j] + opts.score(ca, cb);
            let top = prev[j + 1]
                - if vertical_gaps[j + 1] {
                    opts.gap_extend
                } else {
                    opts.gap_open
                };
            let left = curr[j]
                - if horizontal_gaps[j] {
                    opts.gap_extend
                } else {
                    opts.gap_open
                };
            let best = diagonal.max(left).max(top);
            curr[j + 1] = best;
            if best == diagonal {
                vertical_gaps[j + 1] = false;
                horizontal_gaps[j + 1] = false;
            } else if best == left {
                vertical_gaps[j + 1] = false;
                horizontal_gaps[j + 1] = true;
            } else {
                vertical_gaps[j + 1] = true;
                horizontal_gaps[j + 1] = false;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}
