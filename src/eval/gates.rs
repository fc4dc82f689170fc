use serde::Serialize;

use crate::config::{AcceptanceTargets, GATE_K};
use crate::model::{QueryBucket, RetrievalMode, RunRecord};
use crate::stats::mean;

use super::aggregate::{LatencyAggregate, compare_against_lexical};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDetails {
    pub precision_lift: f64,
    pub hybrid_latency_p95: f64,
    pub noisy_drop: f64,
    pub clean_mrr: f64,
    pub noisy_mrr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceGates {
    pub precision_lift_ok: bool,
    pub latency_ok: bool,
    pub noisy_ok: bool,
    pub details: GateDetails,
}

impl AcceptanceGates {
    pub fn all_passed(&self) -> bool {
        self.precision_lift_ok && self.latency_ok && self.noisy_ok
    }

    /// Names of the gates that did not pass.
    pub fn failures(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if !self.precision_lift_ok {
            out.push("precision_lift");
        }
        if !self.latency_ok {
            out.push("hybrid_p95_latency");
        }
        if !self.noisy_ok {
            out.push("noisy_robustness");
        }
        out
    }
}

pub fn evaluate_gates(
    records: &[RunRecord],
    targets: &AcceptanceTargets,
    max_k: usize,
    latency: &[LatencyAggregate],
) -> AcceptanceGates {
    let precision_lift = compare_against_lexical(records, GATE_K)
        .get(&RetrievalMode::Hybrid)
        .map_or(0.0, |comparison| comparison.lift);

    let hybrid_latency_p95 = latency
        .iter()
        .find(|entry| entry.mode == RetrievalMode::Hybrid)
        .map_or(0.0, |entry| entry.p95);

    let hybrid_at_max_k = records
        .iter()
        .filter(|record| record.mode == RetrievalMode::Hybrid && record.k == max_k);
    let (noisy, clean): (Vec<&RunRecord>, Vec<&RunRecord>) =
        hybrid_at_max_k.partition(|record| record.bucket == QueryBucket::Noisy);
    let noisy_mrr = mean(&noisy.iter().map(|record| record.mrr).collect::<Vec<f64>>());
    let clean_mrr = mean(&clean.iter().map(|record| record.mrr).collect::<Vec<f64>>());
    let noisy_drop = if clean_mrr != 0.0 {
        (clean_mrr - noisy_mrr) / clean_mrr
    } else {
        0.0
    };

    AcceptanceGates {
        precision_lift_ok: precision_lift >= targets.min_precision_lift,
        latency_ok: hybrid_latency_p95 <= targets.p95_latency_ceiling_ms,
        noisy_ok: noisy_drop <= targets.noisy_drop_tolerance,
        details: GateDetails {
            precision_lift,
            hybrid_latency_p95,
            noisy_drop,
            clean_mrr,
            noisy_mrr,
        },
    }
}
