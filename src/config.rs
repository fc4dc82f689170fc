use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::model::{CorpusLevel, DatasetTargets, RetrievalMode};

pub const DEFAULT_LEXICAL_WEIGHT: f64 = 0.25;
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.75;
pub const DEFAULT_POOL_SIZE: usize = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const SNIPPET_LENGTH: usize = 240;
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-base-en-v1.5";

pub const DEFAULT_K_VALUES: [usize; 2] = [5, 10];
pub const DEFAULT_MODES: [RetrievalMode; 3] = [
    RetrievalMode::Hybrid,
    RetrievalMode::Lexical,
    RetrievalMode::Semantic,
];
pub const DEFAULT_RUNS: usize = 3;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_SEED: u32 = 42;
pub const DEFAULT_WARMUPS: usize = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
/// Extra time the HTTP client waits past the per-request deadline, so the
/// sweep's own timeout always fires first.
pub const CLIENT_TIMEOUT_MARGIN_MS: u64 = 500;

/// k at which the precision-lift gate and the baseline comparisons are taken.
pub const GATE_K: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct RankerConfig {
    pub lexical_weight: f64,
    pub semantic_weight: f64,
    pub lexical_pool: usize,
    pub semantic_pool: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub snippet_length: usize,
    pub skip_rerank: bool,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            lexical_weight: DEFAULT_LEXICAL_WEIGHT,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            lexical_pool: DEFAULT_POOL_SIZE,
            semantic_pool: DEFAULT_POOL_SIZE,
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: MAX_SEARCH_LIMIT,
            snippet_length: SNIPPET_LENGTH,
            skip_rerank: false,
        }
    }
}

impl RankerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexical weight", self.lexical_weight),
            ("semantic weight", self.semantic_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                bail!("{name} must be a finite non-negative number, got {weight}");
            }
        }
        if self.lexical_pool == 0 || self.semantic_pool == 0 {
            bail!("candidate pool sizes must be positive");
        }
        if self.max_limit == 0 || self.default_limit == 0 {
            bail!("search limits must be positive");
        }
        Ok(())
    }

    /// Requested limit, defaulted and clamped to `[1, max_limit]`.
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkConfig {
    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub k_values: Vec<usize>,
    pub modes: Vec<RetrievalMode>,
    pub runs: usize,
    pub level: CorpusLevel,
    pub batch_size: usize,
    pub seed: u32,
    pub warmups: usize,
    pub timeout_ms: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_key: None,
            k_values: DEFAULT_K_VALUES.to_vec(),
            modes: DEFAULT_MODES.to_vec(),
            runs: DEFAULT_RUNS,
            level: CorpusLevel::Paper,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
            warmups: DEFAULT_WARMUPS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k_values.is_empty() {
            bail!("at least one k value is required");
        }
        if self.k_values.contains(&0) {
            bail!("k values must be positive: {:?}", self.k_values);
        }
        if self.modes.is_empty() {
            bail!("at least one retrieval mode is required");
        }
        if self.runs == 0 {
            bail!("runs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch size must be at least 1");
        }
        if self.timeout_ms == 0 {
            bail!("timeout must be positive");
        }
        Ok(())
    }

    /// Deadline the runner puts on each ranking call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Timeout for the HTTP client behind the ranking endpoint.
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.saturating_add(CLIENT_TIMEOUT_MARGIN_MS))
    }

    /// Limit requested from the ranker; every k is evaluated on a prefix of it.
    pub fn max_k(&self) -> usize {
        self.k_values.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceTargets {
    pub min_precision_lift: f64,
    pub p95_latency_ceiling_ms: f64,
    pub noisy_drop_tolerance: f64,
}

impl Default for AcceptanceTargets {
    fn default() -> Self {
        Self {
            min_precision_lift: 0.1,
            p95_latency_ceiling_ms: 800.0,
            noisy_drop_tolerance: 0.05,
        }
    }
}

/// Per-field target overrides supplied on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetOverrides {
    pub min_precision_lift: Option<f64>,
    pub p95_latency_ceiling_ms: Option<f64>,
    pub noisy_drop_tolerance: Option<f64>,
}

impl AcceptanceTargets {
    /// Defaults, then dataset meta, then explicit overrides.
    pub fn resolve(dataset: Option<&DatasetTargets>, overrides: TargetOverrides) -> Self {
        let defaults = Self::default();
        let from_dataset = |pick: fn(&DatasetTargets) -> Option<f64>| dataset.and_then(pick);

        Self {
            min_precision_lift: overrides
                .min_precision_lift
                .or_else(|| from_dataset(|t| t.min_precision_lift))
                .unwrap_or(defaults.min_precision_lift),
            p95_latency_ceiling_ms: overrides
                .p95_latency_ceiling_ms
                .or_else(|| from_dataset(|t| t.p95_latency_ms))
                .unwrap_or(defaults.p95_latency_ceiling_ms),
            noisy_drop_tolerance: overrides
                .noisy_drop_tolerance
                .or_else(|| from_dataset(|t| t.noisy_drop_tolerance))
                .unwrap_or(defaults.noisy_drop_tolerance),
        }
    }
}
