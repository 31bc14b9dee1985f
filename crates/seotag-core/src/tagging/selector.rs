//! Top-k selection over a score vector.
//!
//! Ordering is by score descending, ties broken by the lower candidate index.
//! The result is fully deterministic for a given input, which matters because
//! duplicate candidates ("sunset" twice) produce identical scores.

use std::cmp::Ordering;

use crate::error::{TaggingError, TaggingResult};

/// Indices and scores of the `k` best candidates, best first.
///
/// Returns `min(k, scores.len())` entries.
pub fn rank_top_k(scores: &[f32], k: usize) -> TaggingResult<Vec<(usize, f32)>> {
    if k == 0 {
        return Err(TaggingError::InvalidTopK);
    }

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    // Stable sort keeps ascending index order among equal scores.
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.truncate(k);
    Ok(ranked)
}

/// Select the `k` highest-scoring candidate strings, best first.
///
/// `scores` and `candidates` must be index-aligned. If `k` exceeds the number
/// of candidates, every candidate is returned in score order.
pub fn select_top_k(
    scores: &[f32],
    candidates: &[String],
    k: usize,
) -> TaggingResult<Vec<String>> {
    if scores.len() != candidates.len() {
        return Err(TaggingError::ScoreLengthMismatch {
            scores: scores.len(),
            candidates: candidates.len(),
        });
    }

    let ranked = rank_top_k(scores, k)?;
    Ok(ranked
        .into_iter()
        .map(|(idx, _)| candidates[idx].clone())
        .collect())
}

fn descending(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}
