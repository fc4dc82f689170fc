use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use paperlens::config::RankerConfig;
use paperlens::endpoints::{
    HttpEmbedder, HttpReranker, Reranker, SearchRequest, rerank_disabled_flag,
};
use paperlens::model::{CorpusLevel, RetrievalMode, SearchFilters};
use paperlens::ranking::{FusedResult, HybridRanker, PgCandidateStore};
use paperlens::util::condense_whitespace;

use crate::cli::SearchArgs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    mode: RetrievalMode,
    level: CorpusLevel,
    limit: usize,
    returned: usize,
    duration_ms: f64,
    rerank_active: bool,
    results: Vec<FusedResult>,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let timeout = Duration::from_millis(args.timeout_ms);
    let skip_rerank = rerank_disabled_flag(args.skip_rerank.as_deref());

    let store = PgCandidateStore::connect(&args.database_url).await?;
    let embedder = HttpEmbedder::new(&args.embedding_endpoint, &args.embedding_model, timeout)
        .context("failed to build embedding client")?;
    let reranker = HttpReranker::new(args.rerank_endpoint.as_deref(), skip_rerank, timeout)
        .context("failed to build rerank client")?;
    let rerank_active = reranker.is_active();
    let reranker = rerank_active.then(|| Arc::new(reranker) as Arc<dyn Reranker>);

    let config = RankerConfig {
        skip_rerank,
        ..RankerConfig::default()
    };
    let ranker = HybridRanker::new(Arc::new(store), Arc::new(embedder), reranker, config)?;

    let filters = SearchFilters {
        year_from: args.year_from,
        year_to: args.year_to,
        venue: args.venue.clone(),
        subject: args.subject.clone(),
        source: args.source.clone(),
    };
    let request = SearchRequest {
        text: args.query.clone(),
        limit: args.limit,
        mode: Some(args.mode),
        level: Some(args.level),
        filters: (!filters.is_empty()).then_some(filters),
    };

    let started = Instant::now();
    let results = ranker.search(&request).await?;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    info!(
        mode = %args.mode,
        corpus_level = args.level.as_str(),
        returned = results.len(),
        rerank_active,
        duration_ms,
        "search completed"
    );

    let response = SearchResponse {
        query: args.query,
        mode: args.mode,
        level: args.level,
        limit: ranker.config().resolve_limit(args.limit),
        returned: results.len(),
        duration_ms,
        rerank_active,
        results,
    };

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn write_json_response(response: &SearchResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize search json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &SearchResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Query: {}", response.query)?;
    writeln!(
        output,
        "Retrieval: mode={} level={} limit={} rerank={} duration_ms={:.3}",
        response.mode,
        response.level.as_str(),
        response.limit,
        response.rerank_active,
        response.duration_ms,
    )?;
    writeln!(output, "Results: {}", response.returned)?;

    for (index, result) in response.results.iter().enumerate() {
        let candidate = &result.candidate;
        let location = match candidate.chunk_id {
            Some(chunk_id) => format!("{}#{chunk_id}", candidate.id),
            None => candidate.id.clone(),
        };
        let score = match result.rerank_score {
            Some(rerank) => format!("hybrid={:.4} rerank={rerank:.4}", result.hybrid_score),
            None => format!("hybrid={:.4}", result.hybrid_score),
        };

        writeln!(output, "{}. {location} {score}", index + 1)?;
        if let Some(title) = candidate.title.as_deref() {
            writeln!(output, "   {}", condense_whitespace(title))?;
        }
        if let Some(snippet) = candidate.snippet.as_deref() {
            writeln!(output, "   {}", condense_whitespace(snippet))?;
        }
    }

    output.flush()?;
    Ok(())
}
