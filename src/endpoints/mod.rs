//! Seams to the services the ranker and the benchmark talk to, plus their
//! reqwest-backed HTTP adapters.

mod embedding;
mod error;
mod http;
mod rerank;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{CorpusLevel, RetrievalMode, SearchFilters};

pub use self::embedding::HttpEmbedder;
pub use self::error::{ERROR_TEXT_MAX_CHARS, EndpointError};
pub use self::http::{HttpRankingEndpoint, build_client};
pub use self::rerank::{HttpReranker, rerank_disabled_flag};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(rename = "q")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RetrievalMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CorpusLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode.unwrap_or(RetrievalMode::Hybrid)
    }

    pub fn level(&self) -> CorpusLevel {
        self.level.unwrap_or_default()
    }
}

/// Result ids in rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedIds {
    pub ids: Vec<String>,
}

#[async_trait]
pub trait RankingEndpoint: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<RankedIds, EndpointError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EndpointError>;
}

#[async_trait]
pub trait Reranker: Send + Sync {
    /// One score per document, or `None` when reranking is not applied.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
    ) -> Result<Option<Vec<f64>>, EndpointError>;
}
