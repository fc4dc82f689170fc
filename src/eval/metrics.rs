use std::collections::HashSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalMetrics {
    pub precision: f64,
    pub recall: f64,
    pub mrr: f64,
    pub hits: usize,
}

/// Precision, recall, and reciprocal rank over the first `k` retrieved ids.
///
/// Precision is always divided by `k`, even when fewer than `k` ids came
/// back. A relevant id retrieved twice counts once.
pub fn compute_metrics(
    retrieved: &[String],
    relevant: &HashSet<String>,
    k: usize,
) -> RetrievalMetrics {
    if k == 0 {
        return RetrievalMetrics {
            precision: 0.0,
            recall: 0.0,
            mrr: 0.0,
            hits: 0,
        };
    }

    let mut seen = HashSet::<&str>::new();
    let mut hits = 0_usize;
    let mut first_hit_rank = None::<usize>;
    for (index, id) in retrieved.iter().take(k).enumerate() {
        if relevant.contains(id) && seen.insert(id.as_str()) {
            hits += 1;
            first_hit_rank.get_or_insert(index + 1);
        }
    }

    let recall = if relevant.is_empty() {
        0.0
    } else {
        hits as f64 / relevant.len() as f64
    };

    RetrievalMetrics {
        precision: hits as f64 / k as f64,
        recall,
        mrr: first_hit_rank.map_or(0.0, |rank| 1.0 / rank as f64),
        hits,
    }
}
