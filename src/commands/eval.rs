use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use paperlens::config::{
    AcceptanceTargets, BenchmarkConfig, DEFAULT_K_VALUES, DEFAULT_MODES, TargetOverrides,
};
use paperlens::endpoints::HttpRankingEndpoint;
use paperlens::eval::{
    BenchmarkRunner, DatasetInfo, EvaluationReport, load_dataset, probe_endpoint, resource_usage,
    summarize,
};
use paperlens::model::Dataset;
use paperlens::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

use crate::cli::EvalArgs;

pub async fn run(args: EvalArgs) -> Result<()> {
    let run_id = utc_compact_string(Utc::now());
    let dataset = load_dataset(&args.dataset)?;
    let dataset_sha256 = sha256_file(&args.dataset)?;

    let config = benchmark_config(&args, &dataset);
    config
        .validate()
        .context("invalid benchmark configuration")?;
    let targets = AcceptanceTargets::resolve(
        dataset
            .meta
            .as_ref()
            .and_then(|meta| meta.targets.as_ref()),
        TargetOverrides {
            min_precision_lift: args.min_precision_lift,
            p95_latency_ceiling_ms: args.p95_latency_ms,
            noisy_drop_tolerance: args.noisy_drop_tolerance,
        },
    );

    let endpoint = Arc::new(
        HttpRankingEndpoint::new(
            &config.base_url,
            config.api_key.clone(),
            config.client_timeout(),
        )
        .context("failed to build ranking endpoint client")?,
    );

    info!(
        run_id = %run_id,
        endpoint = %endpoint.search_url(),
        queries = dataset.queries.len(),
        k_values = ?config.k_values,
        modes = ?config.modes,
        runs = config.runs,
        corpus_level = config.level.as_str(),
        "evaluation started"
    );

    let runner = BenchmarkRunner::new(endpoint.clone(), config.clone())?;
    let run = runner.run(&dataset).await?;
    let duration_ms = run.duration_ms();
    let summary = summarize(run.records, &config, &targets, run.duration);

    let probes = if args.skip_probes {
        None
    } else {
        let unauthenticated = endpoint.without_api_key();
        Some(probe_endpoint(endpoint.as_ref(), &unauthenticated, config.level).await)
    };

    let report = EvaluationReport {
        generated_at: now_utc_string(),
        run_id,
        dataset: DatasetInfo {
            path: args.dataset.display().to_string(),
            sha256: dataset_sha256,
            queries: dataset.queries.len(),
            meta: dataset.meta.clone(),
        },
        config,
        targets,
        duration_ms,
        summary,
        probes,
        resources: resource_usage(),
    };

    let report_path = args.out.join(format!("eval-{}.json", report.run_id));
    write_json_pretty(&report_path, &report)?;
    info!(
        path = %report_path.display(),
        records = report.summary.records.len(),
        error_rate = report.summary.error_rate,
        gates_passed = report.summary.gates.all_passed(),
        "evaluation report written"
    );
    for warning in &report.summary.warnings {
        warn!(warning = %warning, "evaluation warning");
    }

    if args.json {
        write_json_report(&report)?;
    } else {
        write_text_report(&report, &report_path)?;
    }

    if args.enforce_gates && !report.summary.gates.all_passed() {
        bail!(
            "acceptance gates failed: {}",
            report.summary.gates.failures().join(", ")
        );
    }

    Ok(())
}

fn benchmark_config(args: &EvalArgs, dataset: &Dataset) -> BenchmarkConfig {
    let k_values = if args.k_values.is_empty() {
        dataset
            .meta
            .as_ref()
            .and_then(|meta| meta.k_values.clone())
            .filter(|values| !values.is_empty())
            .unwrap_or_else(|| DEFAULT_K_VALUES.to_vec())
    } else {
        args.k_values.clone()
    };
    let modes = if args.modes.is_empty() {
        DEFAULT_MODES.to_vec()
    } else {
        args.modes.clone()
    };

    BenchmarkConfig {
        base_url: args.base_url.clone(),
        api_key: args.api_key.clone(),
        k_values,
        modes,
        runs: args.runs,
        level: args.level,
        batch_size: args.batch_size,
        seed: args.seed,
        warmups: args.warmups,
        timeout_ms: args.timeout_ms,
    }
}

fn write_json_report(report: &EvaluationReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize evaluation report")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_report(report: &EvaluationReport, report_path: &Path) -> Result<()> {
    let summary = &report.summary;
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Report: {}", report_path.display())?;
    writeln!(
        output,
        "Dataset: {} queries={} sha256={}",
        report.dataset.path, report.dataset.queries, report.dataset.sha256
    )?;
    writeln!(
        output,
        "Records: {} error_rate={:.3} throughput_qps={:.2} duration_ms={:.1}",
        summary.records.len(),
        summary.error_rate,
        summary.throughput_qps,
        report.duration_ms
    )?;

    writeln!(output, "Metrics (all buckets):")?;
    for aggregate in summary.aggregates.iter().filter(|entry| entry.bucket == "all") {
        let ci = aggregate
            .ci
            .map(|ci| format!(" [{:.3}, {:.3}]", ci.lower, ci.upper))
            .unwrap_or_default();
        writeln!(
            output,
            "  {} k={} {}={:.3}{} coverage={:.2}",
            aggregate.mode,
            aggregate.k,
            aggregate.metric.as_str(),
            aggregate.mean,
            ci,
            aggregate.coverage
        )?;
    }

    writeln!(output, "Latency (ms):")?;
    for latency in &summary.latency {
        writeln!(
            output,
            "  {} p50={:.1} p90={:.1} p95={:.1} p99={:.1} avg={:.1}",
            latency.mode, latency.p50, latency.p90, latency.p95, latency.p99, latency.average
        )?;
    }

    for (mode, comparison) in &summary.comparisons {
        writeln!(
            output,
            "Versus lexical: {} lift={:+.3} wilcoxon_p={:.4} z={:.3} pairs={}",
            mode, comparison.lift, comparison.wilcoxon_p, comparison.wilcoxon_z, comparison.pairs
        )?;
    }
    if let Some(friedman) = summary.friedman {
        writeln!(
            output,
            "Friedman: chi_square={:.3} df={} p={:.4}",
            friedman.chi_square, friedman.df, friedman.p_value
        )?;
    }

    let gates = &summary.gates;
    writeln!(
        output,
        "Gates: precision_lift={} ({:.3} >= {:.3}) hybrid_p95={} ({:.1} <= {:.1}) noisy={} ({:.3} <= {:.3})",
        pass_label(gates.precision_lift_ok),
        gates.details.precision_lift,
        report.targets.min_precision_lift,
        pass_label(gates.latency_ok),
        gates.details.hybrid_latency_p95,
        report.targets.p95_latency_ceiling_ms,
        pass_label(gates.noisy_ok),
        gates.details.noisy_drop,
        report.targets.noisy_drop_tolerance,
    )?;

    if let Some(probes) = report.probes.as_ref() {
        writeln!(
            output,
            "Probes: unauthenticated={} rate_limited={} burst_latency_ms={:.1}",
            probes.unauthorized_status, probes.rate_limited, probes.burst_latency_ms
        )?;
    }
    for warning in &summary.warnings {
        writeln!(output, "Warning: {warning}")?;
    }

    output.flush()?;
    Ok(())
}

fn pass_label(passed: bool) -> &'static str {
    if passed { "pass" } else { "FAIL" }
}
