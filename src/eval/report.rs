use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use serde::Serialize;

use crate::config::{AcceptanceTargets, BenchmarkConfig, GATE_K};
use crate::model::{DatasetMeta, RetrievalMode, RunRecord};
use crate::stats::{BootstrapOptions, FriedmanResult};

use super::aggregate::{
    Aggregate, BaselineComparison, LatencyAggregate, aggregate_latency, aggregate_metrics,
    compare_against_lexical, correlate_latency, error_rate, friedman_over_modes,
};
use super::gates::{AcceptanceGates, evaluate_gates};
use super::probe::ProbeReport;
use super::runner::throughput_qps;

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub aggregates: Vec<Aggregate>,
    pub latency: Vec<LatencyAggregate>,
    pub error_rate: f64,
    pub throughput_qps: f64,
    pub comparisons: BTreeMap<RetrievalMode, BaselineComparison>,
    pub latency_correlation: BTreeMap<RetrievalMode, f64>,
    pub friedman: Option<FriedmanResult>,
    pub gates: AcceptanceGates,
    pub warnings: Vec<String>,
    pub records: Vec<RunRecord>,
}

/// Builds every statistic of a sweep. Never decides process success; the
/// caller inspects `gates`.
pub fn summarize(
    records: Vec<RunRecord>,
    config: &BenchmarkConfig,
    targets: &AcceptanceTargets,
    duration: Duration,
) -> EvaluationSummary {
    let max_k = config.max_k();
    let aggregates = aggregate_metrics(&records, BootstrapOptions::default());
    let latency = aggregate_latency(&records);
    let comparisons = compare_against_lexical(&records, GATE_K);
    let latency_correlation = correlate_latency(&records, &config.modes, max_k);
    let friedman = friedman_over_modes(&records, &config.modes, max_k);
    let gates = evaluate_gates(&records, targets, max_k, &latency);
    let warnings = collect_warnings(&records, config, friedman.is_some());

    EvaluationSummary {
        aggregates,
        latency,
        error_rate: error_rate(&records),
        throughput_qps: throughput_qps(records.len(), duration),
        comparisons,
        latency_correlation,
        friedman,
        gates,
        warnings,
        records,
    }
}

fn collect_warnings(
    records: &[RunRecord],
    config: &BenchmarkConfig,
    friedman_available: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();

    let failed = records.iter().filter(|record| record.is_error()).count();
    if failed > 0 {
        warnings.push(format!(
            "{failed} of {} records carry request errors",
            records.len()
        ));
    }
    if !config.k_values.contains(&GATE_K) {
        warnings.push(format!(
            "k={GATE_K} not evaluated; precision lift gate defaults to 0"
        ));
    }
    if !config.modes.contains(&RetrievalMode::Lexical) {
        warnings.push("lexical baseline not evaluated; comparisons are empty".to_string());
    }
    if !config.modes.contains(&RetrievalMode::Hybrid) {
        warnings.push("hybrid mode not evaluated; latency and noisy gates are vacuous".to_string());
    }
    if !friedman_available {
        warnings.push("friedman test not applicable (needs three aligned modes)".to_string());
    }

    warnings
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub path: String,
    pub sha256: String,
    pub queries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DatasetMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub peak_rss_kb: Option<u64>,
    pub current_rss_kb: Option<u64>,
}

/// Process memory as reported by `/proc/self/status`; empty elsewhere.
pub fn resource_usage() -> ResourceUsage {
    match fs::read_to_string("/proc/self/status") {
        Ok(status) => parse_proc_status(&status),
        Err(_) => ResourceUsage::default(),
    }
}

pub(crate) fn parse_proc_status(status: &str) -> ResourceUsage {
    ResourceUsage {
        peak_rss_kb: status_field_kb(status, "VmHWM"),
        current_rss_kb: status_field_kb(status, "VmRSS"),
    }
}

fn status_field_kb(status: &str, key: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim() != key {
            return None;
        }
        value.split_whitespace().next()?.parse::<u64>().ok()
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub run_id: String,
    pub dataset: DatasetInfo,
    pub config: BenchmarkConfig,
    pub targets: AcceptanceTargets,
    pub duration_ms: f64,
    pub summary: EvaluationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<ProbeReport>,
    pub resources: ResourceUsage,
}
