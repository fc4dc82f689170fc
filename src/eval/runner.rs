use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use tracing::{debug, info};

use crate::config::BenchmarkConfig;
use crate::endpoints::{EndpointError, RankingEndpoint, SearchRequest};
use crate::model::{Dataset, Query, RetrievalMode, RunRecord};
use crate::stats::{batches, shuffle};

use super::metrics::compute_metrics;

/// All records of one sweep plus its wall-clock duration.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub records: Vec<RunRecord>,
    pub duration: Duration,
}

impl BenchmarkRun {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    pub fn throughput_qps(&self) -> f64 {
        throughput_qps(self.records.len(), self.duration)
    }
}

pub fn throughput_qps(records: usize, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        records as f64 / secs
    } else {
        0.0
    }
}

/// One ranking call as seen by the benchmark.
#[derive(Debug, Clone)]
struct EndpointOutcome {
    ids: Vec<String>,
    latency_ms: f64,
    error: Option<String>,
}

/// Sweeps a dataset over every configured k, run, and mode against a
/// ranking endpoint.
pub struct BenchmarkRunner {
    endpoint: Arc<dyn RankingEndpoint>,
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    pub fn new(endpoint: Arc<dyn RankingEndpoint>, config: BenchmarkConfig) -> Result<Self> {
        config
            .validate()
            .context("invalid benchmark configuration")?;
        Ok(Self { endpoint, config })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub async fn run(&self, dataset: &Dataset) -> Result<BenchmarkRun> {
        let Some(first_query) = dataset.queries.first() else {
            bail!("dataset contains no queries");
        };

        let max_k = self.config.max_k();
        self.warm_up(first_query, max_k).await;

        let queries = dataset.queries.iter().collect::<Vec<&Query>>();
        let started = Instant::now();
        let mut records = Vec::<RunRecord>::new();

        for &k in &self.config.k_values {
            for run_index in 0..self.config.runs {
                let seed = self
                    .config
                    .seed
                    .wrapping_add(run_index as u32)
                    .wrapping_add(k as u32);
                let ordered = shuffle(&queries, seed);

                for batch in batches(&ordered, self.config.batch_size) {
                    let pending = batch
                        .iter()
                        .map(|query| self.evaluate_query(query, k, run_index, max_k));
                    for query_records in join_all(pending).await {
                        records.extend(query_records);
                    }
                }

                debug!(k, run_index, seed, records = records.len(), "run finished");
            }
        }

        let run = BenchmarkRun {
            records,
            duration: started.elapsed(),
        };
        info!(
            queries = dataset.queries.len(),
            records = run.records.len(),
            duration_ms = run.duration_ms(),
            "benchmark sweep completed"
        );
        Ok(run)
    }

    async fn warm_up(&self, query: &Query, max_k: usize) {
        for attempt in 0..self.config.warmups {
            let request = SearchRequest {
                text: query.text.clone(),
                limit: Some(max_k),
                mode: Some(RetrievalMode::Hybrid),
                level: Some(self.config.level),
                filters: None,
            };
            let outcome = self.call(request).await;
            if let Some(error) = outcome.error {
                debug!(attempt, error = %error, "warm-up request failed");
            }
        }
    }

    async fn evaluate_query(
        &self,
        query: &Query,
        k: usize,
        run_index: usize,
        max_k: usize,
    ) -> Vec<RunRecord> {
        let relevant = query
            .relevant_ids
            .iter()
            .cloned()
            .collect::<HashSet<String>>();
        let mut memo = HashMap::<RetrievalMode, EndpointOutcome>::new();
        let mut records = Vec::with_capacity(self.config.modes.len());

        for &mode in &self.config.modes {
            let outcome = match memo.entry(mode) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let request = SearchRequest {
                        text: query.text.clone(),
                        limit: Some(max_k),
                        mode: Some(mode),
                        level: Some(self.config.level),
                        filters: query.filters.clone(),
                    };
                    entry.insert(self.call(request).await)
                }
            };

            let metrics = compute_metrics(&outcome.ids, &relevant, k);
            records.push(RunRecord {
                query_id: query.id.clone(),
                bucket: query.bucket,
                need_tag: query.need_tag.clone(),
                mode,
                run_index,
                k,
                latency_ms: outcome.latency_ms,
                retrieved_ids: outcome.ids.iter().take(k).cloned().collect(),
                relevant_ids: query.relevant_ids.clone(),
                precision: metrics.precision,
                recall: metrics.recall,
                mrr: metrics.mrr,
                error: outcome.error.clone(),
            });
        }

        records
    }

    async fn call(&self, request: SearchRequest) -> EndpointOutcome {
        let started = Instant::now();
        let result =
            tokio::time::timeout(self.config.request_timeout(), self.endpoint.search(&request))
                .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let failure = match result {
            Ok(Ok(ranked)) => {
                return EndpointOutcome {
                    ids: ranked.ids,
                    latency_ms,
                    error: None,
                };
            }
            Ok(Err(err)) => err,
            Err(_) => EndpointError::Timeout {
                timeout_ms: self.config.timeout_ms,
            },
        };

        debug!(
            mode = %request.mode(),
            error = %failure,
            "ranking request failed"
        );
        EndpointOutcome {
            ids: Vec::new(),
            latency_ms,
            error: Some(failure.record_text()),
        }
    }
}
