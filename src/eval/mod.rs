//! Offline benchmark of a ranking endpoint: dataset loading, the batched
//! sweep, metric aggregation, significance tests, and acceptance gates.

mod aggregate;
mod dataset;
mod gates;
mod metrics;
mod probe;
mod report;
mod runner;

pub use self::aggregate::{
    Aggregate, BaselineComparison, LatencyAggregate, MetricKind, aggregate_latency,
    aggregate_metrics, compare_against_lexical, correlate_latency, error_rate,
    friedman_over_modes,
};
pub use self::dataset::{load_dataset, parse_dataset};
pub use self::gates::{AcceptanceGates, GateDetails, evaluate_gates};
pub use self::metrics::{RetrievalMetrics, compute_metrics};
pub use self::probe::{BURST_REQUESTS, ProbeReport, probe_endpoint};
pub use self::report::{
    DatasetInfo, EvaluationReport, EvaluationSummary, ResourceUsage, resource_usage, summarize,
};
pub use self::runner::{BenchmarkRun, BenchmarkRunner, throughput_qps};
