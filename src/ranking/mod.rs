//! Hybrid lexical + semantic ranking over the paper corpus.

mod candidate;
mod fusion;
mod ranker;
mod store;

pub use self::candidate::{Candidate, CandidateKey, FusedResult};
pub use self::fusion::{
    FusionWeights, ScoreSignal, apply_rerank_scores, fuse_weighted, rank_single_signal,
};
pub use self::ranker::HybridRanker;
pub use self::store::{CandidateStore, PgCandidateStore, PoolQuery};
