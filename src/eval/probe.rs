use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use crate::endpoints::{RankingEndpoint, SearchRequest};
use crate::model::{CorpusLevel, RetrievalMode};

pub const BURST_REQUESTS: usize = 6;

/// Access-control and rate-limit observations for a ranking service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Error text of the credential-less request, or `"allowed"`.
    pub unauthorized_status: String,
    pub rate_limited: bool,
    pub burst_requests: usize,
    pub burst_latency_ms: f64,
}

/// Sends one request through `unauthenticated` and a concurrent burst of
/// lexical requests through `endpoint`.
pub async fn probe_endpoint(
    endpoint: &dyn RankingEndpoint,
    unauthenticated: &dyn RankingEndpoint,
    level: CorpusLevel,
) -> ProbeReport {
    let unauthorized = SearchRequest {
        limit: Some(1),
        mode: Some(RetrievalMode::Hybrid),
        level: Some(level),
        ..SearchRequest::new("security probe")
    };
    let unauthorized_status = match unauthenticated.search(&unauthorized).await {
        Ok(_) => "allowed".to_string(),
        Err(err) => err.record_text(),
    };

    let burst = SearchRequest {
        limit: Some(1),
        mode: Some(RetrievalMode::Lexical),
        level: Some(level),
        ..SearchRequest::new("rate limit probe")
    };
    let started = Instant::now();
    let outcomes = join_all((0..BURST_REQUESTS).map(|_| endpoint.search(&burst))).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let rate_limited = outcomes
        .iter()
        .any(|outcome| matches!(outcome, Err(err) if err.is_rate_limited()));

    let report = ProbeReport {
        unauthorized_status,
        rate_limited,
        burst_requests: BURST_REQUESTS,
        burst_latency_ms: elapsed_ms / BURST_REQUESTS as f64,
    };
    info!(
        unauthorized = %report.unauthorized_status,
        rate_limited = report.rate_limited,
        burst_latency_ms = report.burst_latency_ms,
        "endpoint probes completed"
    );
    report
}
