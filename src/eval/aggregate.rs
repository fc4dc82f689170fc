use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::{QueryBucket, RetrievalMode, RunRecord};
use crate::stats::{
    BootstrapOptions, ConfidenceInterval, FriedmanResult, bootstrap_ci, friedman, mean, pearson,
    percentile, wilcoxon_signed_rank,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Precision,
    Recall,
    Mrr,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [Self::Precision, Self::Recall, Self::Mrr];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::Mrr => "mrr",
        }
    }

    pub fn value(self, record: &RunRecord) -> f64 {
        match self {
            Self::Precision => record.precision,
            Self::Recall => record.recall,
            Self::Mrr => record.mrr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub metric: MetricKind,
    pub mode: RetrievalMode,
    pub k: usize,
    /// `"all"` or a query bucket name.
    pub bucket: String,
    pub mean: f64,
    /// Share of records with a non-zero value.
    pub coverage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci: Option<ConfidenceInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyAggregate {
    pub mode: RetrievalMode,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub average: f64,
}

/// Paired comparison of one mode against the lexical baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineComparison {
    pub lift: f64,
    pub wilcoxon_p: f64,
    pub wilcoxon_z: f64,
    pub pairs: usize,
}

pub fn error_rate(records: &[RunRecord]) -> f64 {
    let errors = records.iter().filter(|record| record.is_error()).count();
    errors as f64 / records.len().max(1) as f64
}

/// Mean, coverage, and bootstrap interval per metric, mode, and k, overall
/// and per bucket.
pub fn aggregate_metrics(records: &[RunRecord], bootstrap: BootstrapOptions) -> Vec<Aggregate> {
    let mut out = Vec::new();

    for mode in modes_in_order(records) {
        for k in ks_in_order(records) {
            let subset = records
                .iter()
                .filter(|record| record.mode == mode && record.k == k)
                .collect::<Vec<&RunRecord>>();

            let mut by_bucket = BTreeMap::<QueryBucket, Vec<&RunRecord>>::new();
            for &record in &subset {
                by_bucket.entry(record.bucket).or_default().push(record);
            }

            for metric in MetricKind::ALL {
                out.push(summarize_metric(metric, mode, k, "all", &subset, bootstrap));
                for (bucket, bucket_records) in &by_bucket {
                    out.push(summarize_metric(
                        metric,
                        mode,
                        k,
                        bucket.as_str(),
                        bucket_records,
                        bootstrap,
                    ));
                }
            }
        }
    }

    out
}

fn summarize_metric(
    metric: MetricKind,
    mode: RetrievalMode,
    k: usize,
    bucket: &str,
    records: &[&RunRecord],
    bootstrap: BootstrapOptions,
) -> Aggregate {
    let values = records
        .iter()
        .map(|record| metric.value(record))
        .collect::<Vec<f64>>();
    let non_zero = values.iter().filter(|value| **value > 0.0).count();

    Aggregate {
        metric,
        mode,
        k,
        bucket: bucket.to_string(),
        mean: mean(&values),
        coverage: non_zero as f64 / values.len().max(1) as f64,
        ci: bootstrap_ci(&values, bootstrap),
    }
}

/// Latency percentiles per mode over every record of that mode, all k
/// values and failed calls included.
pub fn aggregate_latency(records: &[RunRecord]) -> Vec<LatencyAggregate> {
    modes_in_order(records)
        .into_iter()
        .map(|mode| {
            let latencies = records
                .iter()
                .filter(|record| record.mode == mode)
                .map(|record| record.latency_ms)
                .collect::<Vec<f64>>();
            LatencyAggregate {
                mode,
                p50: percentile(&latencies, 50.0),
                p90: percentile(&latencies, 90.0),
                p95: percentile(&latencies, 95.0),
                p99: percentile(&latencies, 99.0),
                average: mean(&latencies),
            }
        })
        .collect()
}

/// Precision@k of the semantic and hybrid modes against lexical, paired by
/// `(query_id, run_index)`. Challengers without records are left out.
pub fn compare_against_lexical(
    records: &[RunRecord],
    k: usize,
) -> BTreeMap<RetrievalMode, BaselineComparison> {
    let baseline = records
        .iter()
        .filter(|record| record.mode == RetrievalMode::Lexical && record.k == k)
        .map(|record| (record.pair_key(), record.precision))
        .collect::<HashMap<(String, usize), f64>>();

    let mut out = BTreeMap::new();
    for mode in [RetrievalMode::Semantic, RetrievalMode::Hybrid] {
        let challengers = records
            .iter()
            .filter(|record| record.mode == mode && record.k == k)
            .collect::<Vec<&RunRecord>>();
        if challengers.is_empty() {
            continue;
        }

        let diffs = challengers
            .iter()
            .filter_map(|record| {
                baseline
                    .get(&record.pair_key())
                    .map(|base| record.precision - base)
            })
            .collect::<Vec<f64>>();
        let test = wilcoxon_signed_rank(&diffs);
        out.insert(
            mode,
            BaselineComparison {
                lift: mean(&diffs),
                wilcoxon_p: test.p_value,
                wilcoxon_z: test.z,
                pairs: diffs.len(),
            },
        );
    }

    out
}

/// Pearson correlation of latency and MRR at `k`, per mode, ignoring failed
/// calls.
pub fn correlate_latency(
    records: &[RunRecord],
    modes: &[RetrievalMode],
    k: usize,
) -> BTreeMap<RetrievalMode, f64> {
    let mut out = BTreeMap::new();
    for &mode in modes {
        let (latencies, mrrs): (Vec<f64>, Vec<f64>) = records
            .iter()
            .filter(|record| record.mode == mode && record.k == k && !record.is_error())
            .map(|record| (record.latency_ms, record.mrr))
            .unzip();
        out.insert(mode, pearson(&latencies, &mrrs));
    }
    out
}

/// Friedman test on MRR@k across `modes`, with rows aligned by
/// `(query_id, run_index)`. Keys missing from any mode are dropped.
pub fn friedman_over_modes(
    records: &[RunRecord],
    modes: &[RetrievalMode],
    k: usize,
) -> Option<FriedmanResult> {
    let mut distinct = Vec::<RetrievalMode>::new();
    for &mode in modes {
        if !distinct.contains(&mode) {
            distinct.push(mode);
        }
    }

    let by_mode = distinct
        .iter()
        .map(|&mode| {
            records
                .iter()
                .filter(|record| record.mode == mode && record.k == k)
                .map(|record| (record.pair_key(), record.mrr))
                .collect::<BTreeMap<(String, usize), f64>>()
        })
        .collect::<Vec<BTreeMap<(String, usize), f64>>>();

    let first = by_mode.first()?;
    let shared_keys = first
        .keys()
        .filter(|key| by_mode.iter().all(|values| values.contains_key(*key)))
        .collect::<Vec<&(String, usize)>>();

    let columns = by_mode
        .iter()
        .map(|values| {
            shared_keys
                .iter()
                .filter_map(|key| values.get(*key).copied())
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<Vec<f64>>>();
    let groups = columns.iter().map(Vec::as_slice).collect::<Vec<&[f64]>>();

    friedman(&groups)
}

fn modes_in_order(records: &[RunRecord]) -> Vec<RetrievalMode> {
    let mut out = Vec::new();
    for record in records {
        if !out.contains(&record.mode) {
            out.push(record.mode);
        }
    }
    out
}

fn ks_in_order(records: &[RunRecord]) -> Vec<usize> {
    let mut out = Vec::new();
    for record in records {
        if !out.contains(&record.k) {
            out.push(record.k);
        }
    }
    out
}
