use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Default RRF constant
pub const DEFAULT_RRF_K: u32 = 60;

/// An id with its accumulated fusion score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult<T> {
    pub id: T,
    pub score: f64,
}

/// Reciprocal Rank Fusion.
///
/// RRF(d) = Σ 1 / (k + rank(d)), with 1-based ranks. A list that does not
/// contain `d` contributes nothing. The result covers every id seen and is
/// sorted by descending score; ties keep the order in which ids were first
/// encountered (lists in order, then rank within each list). Duplicates
/// within one list contribute once per occurrence.
pub fn reciprocal_rank_fusion<T>(lists: &[Vec<T>], k: u32) -> Vec<FusedResult<T>>
where
    T: Hash + Eq + Clone,
{
    let k = f64::from(k);
    let mut scores: IndexMap<T, f64> = IndexMap::new();

    for list in lists {
        for (rank, id) in list.iter().enumerate() {
            let contribution = 1.0 / (rank as f64 + 1.0 + k);
            *scores.entry(id.clone()).or_insert(0.0) += contribution;
        }
    }

    let mut fused: Vec<FusedResult<T>> = scores
        .into_iter()
        .map(|(id, score)| FusedResult { id, score })
        .collect();
    // sort_by is stable, so ties stay in first-encounter order
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        "RRF fused {} lists into {} results",
        lists.len(),
        fused.len()
    );
    fused
}
