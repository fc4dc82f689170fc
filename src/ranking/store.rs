use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use crate::model::{CorpusLevel, SearchFilters};

use super::candidate::Candidate;

/// Parameters shared by both candidate pools.
#[derive(Debug, Clone, Copy)]
pub struct PoolQuery<'a> {
    pub text: &'a str,
    pub level: CorpusLevel,
    pub filters: Option<&'a SearchFilters>,
    pub size: usize,
    pub snippet_length: usize,
}

/// Source of scored candidates. The store computes both the lexical rank
/// and the vector similarity; callers only fuse.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Candidates ordered by lexical score, descending.
    async fn lexical_pool(&self, query: &PoolQuery<'_>) -> Result<Vec<Candidate>>;

    /// Candidates ordered by cosine similarity to `embedding`, descending.
    async fn semantic_pool(
        &self,
        query: &PoolQuery<'_>,
        embedding: &[f32],
    ) -> Result<Vec<Candidate>>;
}

/// Postgres full-text search plus pgvector over `papers` and `paper_chunks`.
#[derive(Debug, Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to candidate store")?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn lexical_pool(&self, query: &PoolQuery<'_>) -> Result<Vec<Candidate>> {
        let mut builder =
            QueryBuilder::<Postgres>::new("WITH q AS (SELECT plainto_tsquery('english', ");
        builder.push_bind(query.text.to_string());
        builder.push(") AS q_ts) ");

        let tsv = match query.level {
            CorpusLevel::Paper => {
                push_paper_columns(&mut builder, query.snippet_length);
                builder.push(
                    ", ts_rank_cd(p.tsv, q.q_ts)::float8 AS lex_score, \
                     NULL::float8 AS sem_score FROM papers p, q",
                );
                "p.tsv"
            }
            CorpusLevel::Chunk => {
                push_chunk_columns(&mut builder, query.snippet_length);
                builder.push(
                    ", ts_rank_cd(c.tsv, q.q_ts)::float8 AS lex_score, \
                     NULL::float8 AS sem_score \
                     FROM paper_chunks c JOIN papers p ON c.paper_id = p.id, q",
                );
                "c.tsv"
            }
        };

        builder.push(" WHERE q.q_ts <> ''::tsquery AND ");
        builder.push(tsv);
        builder.push(" @@ q.q_ts");
        push_filters(&mut builder, query.filters);
        builder.push(" ORDER BY lex_score DESC LIMIT ");
        builder.push_bind(limit_param(query.size)?);

        let rows = builder
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await
            .with_context(|| {
                format!("lexical pool query failed (level={})", query.level.as_str())
            })?;

        debug!(level = query.level.as_str(), rows = rows.len(), "lexical pool fetched");
        Ok(rows)
    }

    async fn semantic_pool(
        &self,
        query: &PoolQuery<'_>,
        embedding: &[f32],
    ) -> Result<Vec<Candidate>> {
        let vector = vector_literal(embedding)?;
        let mut builder = QueryBuilder::<Postgres>::new("WITH q AS (SELECT ");
        builder.push_bind(vector);
        builder.push("::text::vector AS q_vec) ");

        let column = match query.level {
            CorpusLevel::Paper => {
                push_paper_columns(&mut builder, query.snippet_length);
                builder.push(
                    ", NULL::float8 AS lex_score, \
                     (1 - (p.embedding <=> q.q_vec))::float8 AS sem_score FROM papers p, q",
                );
                "p.embedding"
            }
            CorpusLevel::Chunk => {
                push_chunk_columns(&mut builder, query.snippet_length);
                builder.push(
                    ", NULL::float8 AS lex_score, \
                     (1 - (c.chunk_embedding <=> q.q_vec))::float8 AS sem_score \
                     FROM paper_chunks c JOIN papers p ON c.paper_id = p.id, q",
                );
                "c.chunk_embedding"
            }
        };

        builder.push(" WHERE ");
        builder.push(column);
        builder.push(" IS NOT NULL");
        push_filters(&mut builder, query.filters);
        builder.push(" ORDER BY ");
        builder.push(column);
        builder.push(" <=> q.q_vec LIMIT ");
        builder.push_bind(limit_param(query.size)?);

        let rows = builder
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await
            .with_context(|| {
                format!("semantic pool query failed (level={})", query.level.as_str())
            })?;

        debug!(level = query.level.as_str(), rows = rows.len(), "semantic pool fetched");
        Ok(rows)
    }
}

fn push_paper_columns(builder: &mut QueryBuilder<'_, Postgres>, snippet_length: usize) {
    builder.push(
        "SELECT p.id::text AS id, NULL::int8 AS chunk_id, p.title, p.abstract, p.doi, p.url, \
         p.subjects, p.source, LEFT(p.abstract, ",
    );
    builder.push(snippet_length.to_string());
    builder.push(") AS snippet");
}

fn push_chunk_columns(builder: &mut QueryBuilder<'_, Postgres>, snippet_length: usize) {
    builder.push(
        "SELECT p.id::text AS id, c.chunk_id::int8 AS chunk_id, p.title, p.abstract, p.doi, \
         p.url, p.subjects, p.source, LEFT(c.chunk_text, ",
    );
    builder.push(snippet_length.to_string());
    builder.push(") AS snippet");
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: Option<&SearchFilters>) {
    let Some(filters) = filters else {
        return;
    };

    if let Some(year_from) = filters.year_from {
        builder.push(" AND p.year >= ");
        builder.push_bind(year_from);
    }
    if let Some(year_to) = filters.year_to {
        builder.push(" AND p.year <= ");
        builder.push_bind(year_to);
    }
    if let Some(venue) = filters.venue.as_deref() {
        builder.push(" AND p.venue ILIKE ");
        builder.push_bind(venue.to_string());
    }
    if let Some(subject) = filters.subject.as_deref() {
        builder.push(" AND p.subjects @> ARRAY[");
        builder.push_bind(subject.to_string());
        builder.push("]::text[]");
    }
    if let Some(source) = filters.source.as_deref() {
        builder.push(" AND p.source = ");
        builder.push_bind(source.to_string());
    }
}

fn limit_param(size: usize) -> Result<i64> {
    i64::try_from(size).with_context(|| format!("pool size out of range: {size}"))
}

/// pgvector text literal, e.g. `[0.1,0.2]`.
pub(crate) fn vector_literal(embedding: &[f32]) -> Result<String> {
    if embedding.is_empty() {
        bail!("embedding vector missing");
    }
    let parts = embedding
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>();
    Ok(format!("[{}]", parts.join(",")))
}
