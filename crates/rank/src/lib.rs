//! Rank fusion for talentsift.
//
// Combines the lexical and vector candidate rankings into one ordered
// candidate set via reciprocal-rank fusion (RRF). RRF only looks at rank
// positions, which is what lets it combine the two otherwise
// incommensurable scoring scales (BM25 scores vs. L2 distances).

use std::cmp::Ordering;
use std::collections::HashMap;

/// Standard RRF constant. k=60 balances top-heavy and uniform ranking.
pub const DEFAULT_RRF_C: f64 = 60.0;

/// A candidate surviving fusion, with its accumulated score and the
/// input lists it appeared in.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    /// Catalog item identifier (position in the catalog store).
    pub id: usize,
    /// Accumulated reciprocal-rank score.
    pub score: f64,
    pub from_lexical: bool,
    pub from_vector: bool,
}

/// Fuse two ranked id lists, returning the top `k` ids.
///
/// Each id at 0-based rank `r` in an input list contributes
/// `1 / (C + r + 1)`; an id present in both lists sums both contributions.
/// Output is ordered by accumulated score descending, ties broken by
/// ascending id. Pure function of its inputs.
pub fn fuse(lexical: &[usize], vector: &[usize], k: usize) -> Vec<usize> {
    fuse_detailed(lexical, vector, k, DEFAULT_RRF_C)
        .into_iter()
        .map(|c| c.id)
        .collect()
}

/// As [`fuse`], but with an explicit RRF constant and full per-candidate
/// detail in the output.
pub fn fuse_detailed(
    lexical: &[usize],
    vector: &[usize],
    k: usize,
    c: f64,
) -> Vec<FusedCandidate> {
    // (score, in lexical, in vector) per id
    let mut scores: HashMap<usize, (f64, bool, bool)> = HashMap::new();

    for (rank, id) in lexical.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, false, false));
        entry.0 += contribution(rank, c);
        entry.1 = true;
    }
    for (rank, id) in vector.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, false, false));
        entry.0 += contribution(rank, c);
        entry.2 = true;
    }

    let mut fused: Vec<FusedCandidate> = scores
        .into_iter()
        .map(|(id, (score, from_lexical, from_vector))| FusedCandidate {
            id,
            score,
            from_lexical,
            from_vector,
        })
        .collect();

    // Score descending, then id ascending. Scores are sums of positive
    // reciprocals so partial_cmp cannot observe NaN.
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    fused.truncate(k);
    fused
}

/// RRF contribution of a 0-based rank: `1 / (c + rank + 1)`.
fn contribution(rank: usize, c: f64) -> f64 {
    1.0 / (c + rank as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_list_preserves_order() {
        let fused = fuse(&[3, 1, 2], &[], 10);
        assert_eq!(fused, vec![3, 1, 2]);
    }

    #[test]
    fn exact_scores_for_single_list() {
        let fused = fuse_detailed(&[7, 8], &[], 10, DEFAULT_RRF_C);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
        assert!((fused[1].score - 1.0 / 62.0).abs() < 1e-12);
        assert!(fused[0].from_lexical && !fused[0].from_vector);
    }

    #[test]
    fn item_in_both_lists_sums_contributions() {
        // id 5 is rank 0 in both lists: 1/61 + 1/61
        let fused = fuse_detailed(&[5, 1], &[5, 2], 10, DEFAULT_RRF_C);
        assert_eq!(fused[0].id, 5);
        assert!((fused[0].score - 2.0 / 61.0).abs() < 1e-12);
        assert!(fused[0].from_lexical && fused[0].from_vector);
    }

    #[test]
    fn both_lists_beats_single_list_at_equal_rank() {
        // id 1 is in both lists (ranks 1 and 1); id 9 only in lexical at
        // rank 0. 1/62 + 1/62 > 1/61, so id 1 must rank above id 9.
        let fused = fuse(&[9, 1], &[8, 1], 10);
        let pos1 = fused.iter().position(|&id| id == 1).unwrap();
        let pos9 = fused.iter().position(|&id| id == 9).unwrap();
        assert!(pos1 < pos9);
    }

    #[test]
    fn ties_break_by_ascending_id() {
        // ids 4 and 2 each appear once at rank 0 of one list: equal score.
        let fused = fuse(&[4], &[2], 10);
        assert_eq!(fused, vec![2, 4]);
    }

    #[test]
    fn truncates_to_k() {
        let lexical: Vec<usize> = (0..30).collect();
        let fused = fuse(&lexical, &[], 20);
        assert_eq!(fused.len(), 20);
    }

    #[test]
    fn deterministic_across_calls() {
        let lexical = vec![0, 4, 2, 9, 7];
        let vector = vec![9, 0, 3, 8];
        let a = fuse(&lexical, &vector, 20);
        let b = fuse(&lexical, &vector, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        assert!(fuse(&[], &[], 20).is_empty());
    }
}
