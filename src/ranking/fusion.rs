use std::collections::HashMap;

use super::candidate::{Candidate, CandidateKey, FusedResult};

/// The one score a single-signal ranking orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSignal {
    Lexical,
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f64,
    pub semantic: f64,
}

/// Weighted-sum fusion of a lexical and a semantic pool.
///
/// Candidates are unioned by key; input order is the lexical pool followed
/// by semantic-only entries, and the stable sort keeps that order on ties.
pub fn fuse_weighted(
    lexical: &[Candidate],
    semantic: &[Candidate],
    weights: FusionWeights,
    limit: usize,
) -> Vec<FusedResult> {
    let mut merged = Vec::<Candidate>::with_capacity(lexical.len() + semantic.len());
    let mut positions = HashMap::<CandidateKey, usize>::new();

    for candidate in lexical.iter().chain(semantic) {
        match positions.get(&candidate.key()) {
            Some(&index) => merged[index].absorb_scores(candidate),
            None => {
                positions.insert(candidate.key(), merged.len());
                merged.push(candidate.clone());
            }
        }
    }

    let mut out = merged
        .into_iter()
        .map(|candidate| {
            let hybrid_score = weights.lexical * candidate.lexical_score.unwrap_or(0.0)
                + weights.semantic * candidate.semantic_score.unwrap_or(0.0);
            FusedResult {
                candidate,
                hybrid_score,
                rerank_score: None,
            }
        })
        .collect::<Vec<FusedResult>>();

    sort_by_hybrid_score(&mut out);
    out.truncate(limit);
    out
}

/// Ranks a single pool by one score. A missing score counts as zero.
pub fn rank_single_signal(
    pool: &[Candidate],
    signal: ScoreSignal,
    limit: usize,
) -> Vec<FusedResult> {
    let mut out = pool
        .iter()
        .map(|candidate| {
            let score = match signal {
                ScoreSignal::Lexical => candidate.lexical_score,
                ScoreSignal::Semantic => candidate.semantic_score,
            };
            FusedResult {
                candidate: candidate.clone(),
                hybrid_score: score.unwrap_or(0.0),
                rerank_score: None,
            }
        })
        .collect::<Vec<FusedResult>>();

    sort_by_hybrid_score(&mut out);
    out.truncate(limit);
    out
}

/// Re-sorts `results` by `scores` when there is exactly one score per
/// result. Returns whether the scores were applied.
pub fn apply_rerank_scores(results: &mut [FusedResult], scores: &[f64]) -> bool {
    if scores.len() != results.len() || results.is_empty() {
        return false;
    }

    for (result, score) in results.iter_mut().zip(scores) {
        result.rerank_score = Some(*score);
    }
    results.sort_by(|left, right| {
        right
            .rerank_score
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&left.rerank_score.unwrap_or(f64::NEG_INFINITY))
    });
    true
}

fn sort_by_hybrid_score(results: &mut [FusedResult]) {
    results.sort_by(|left, right| right.hybrid_score.total_cmp(&left.hybrid_score));
}
