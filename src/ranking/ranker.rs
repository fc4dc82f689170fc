use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::RankerConfig;
use crate::endpoints::{
    Embedder, EndpointError, RankedIds, RankingEndpoint, Reranker, SearchRequest,
};
use crate::model::{QUERY_MAX_LENGTH, RetrievalMode};

use super::candidate::FusedResult;
use super::fusion::{
    FusionWeights, ScoreSignal, apply_rerank_scores, fuse_weighted, rank_single_signal,
};
use super::store::{CandidateStore, PoolQuery};

/// Query-time ranker: fetches candidate pools from the store, fuses them,
/// and optionally reorders the top results with a reranker.
pub struct HybridRanker {
    store: Arc<dyn CandidateStore>,
    embedder: Arc<dyn Embedder>,
    reranker: Option<Arc<dyn Reranker>>,
    config: RankerConfig,
}

impl HybridRanker {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        embedder: Arc<dyn Embedder>,
        reranker: Option<Arc<dyn Reranker>>,
        config: RankerConfig,
    ) -> Result<Self> {
        config.validate().context("invalid ranker configuration")?;
        Ok(Self {
            store,
            embedder,
            reranker,
            config,
        })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<FusedResult>> {
        validate_request(request)?;

        let limit = self.config.resolve_limit(request.limit);
        let mode = request.mode();
        let pool_query = PoolQuery {
            text: &request.text,
            level: request.level(),
            filters: request.filters.as_ref().filter(|filters| !filters.is_empty()),
            size: limit,
            snippet_length: self.config.snippet_length,
        };

        let embedding = if mode.needs_embedding() {
            let vector = self
                .embedder
                .embed(&request.text)
                .await
                .context("failed to embed query")?;
            if vector.is_empty() {
                bail!("embedding vector missing");
            }
            Some(vector)
        } else {
            None
        };

        let mut results = match (mode, embedding.as_deref()) {
            (RetrievalMode::Lexical, _) => {
                let pool = self.store.lexical_pool(&pool_query).await?;
                rank_single_signal(&pool, ScoreSignal::Lexical, limit)
            }
            (RetrievalMode::Semantic, Some(vector)) => {
                let pool = self.store.semantic_pool(&pool_query, vector).await?;
                rank_single_signal(&pool, ScoreSignal::Semantic, limit)
            }
            (RetrievalMode::Hybrid, Some(vector)) => {
                let lexical_query = PoolQuery {
                    size: self.config.lexical_pool,
                    ..pool_query
                };
                let semantic_query = PoolQuery {
                    size: self.config.semantic_pool,
                    ..pool_query
                };
                let lexical = self.store.lexical_pool(&lexical_query).await?;
                let semantic = self.store.semantic_pool(&semantic_query, vector).await?;
                debug!(
                    lexical = lexical.len(),
                    semantic = semantic.len(),
                    "candidate pools fetched"
                );
                fuse_weighted(
                    &lexical,
                    &semantic,
                    FusionWeights {
                        lexical: self.config.lexical_weight,
                        semantic: self.config.semantic_weight,
                    },
                    limit,
                )
            }
            (_, None) => bail!("embedding vector missing"),
        };

        if mode.needs_embedding() {
            self.rerank(&request.text, &mut results).await;
        }

        Ok(results)
    }

    async fn rerank(&self, query: &str, results: &mut [FusedResult]) {
        let Some(reranker) = self.reranker.as_ref() else {
            return;
        };
        if self.config.skip_rerank || results.is_empty() {
            return;
        }

        let documents = results
            .iter()
            .map(|result| result.candidate.rerank_text())
            .collect::<Vec<String>>();

        match reranker.rerank(query, &documents).await {
            Ok(Some(scores)) => {
                if !apply_rerank_scores(results, &scores) {
                    warn!(
                        expected = results.len(),
                        received = scores.len(),
                        "rerank score count mismatch, keeping fusion order"
                    );
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err.record_text(), "rerank failed, keeping fusion order");
            }
        }
    }
}

#[async_trait]
impl RankingEndpoint for HybridRanker {
    async fn search(&self, request: &SearchRequest) -> Result<RankedIds, EndpointError> {
        let results = HybridRanker::search(self, request)
            .await
            .map_err(|err| EndpointError::Ranker(format!("{err:#}")))?;
        Ok(RankedIds {
            ids: results
                .into_iter()
                .map(|result| result.candidate.id)
                .collect(),
        })
    }
}

fn validate_request(request: &SearchRequest) -> Result<()> {
    if request.text.trim().is_empty() {
        bail!("query text is required");
    }
    let length = request.text.chars().count();
    if length > QUERY_MAX_LENGTH {
        bail!("query text exceeds {QUERY_MAX_LENGTH} characters ({length})");
    }
    if let Some(filters) = request.filters.as_ref() {
        filters.validate().context("invalid search filters")?;
    }
    Ok(())
}
