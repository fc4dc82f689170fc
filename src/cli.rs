use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use paperlens::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_MODEL, DEFAULT_RUNS, DEFAULT_SEED, DEFAULT_TIMEOUT_MS,
    DEFAULT_WARMUPS,
};
use paperlens::model::{CorpusLevel, RetrievalMode};

#[derive(Parser, Debug)]
#[command(
    name = "paperlens",
    version,
    about = "Hybrid paper retrieval and its offline evaluation harness"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a ranking endpoint against a labeled query set.
    Eval(EvalArgs),
    /// Run the in-process hybrid ranker against the Postgres corpus.
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long, default_value = "reports")]
    pub out: PathBuf,

    #[arg(long, env = "PAPERLENS_BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    #[arg(long, env = "PAPERLENS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Cutoffs to evaluate; defaults to the dataset's kValues, then 5,10.
    #[arg(long = "k", value_delimiter = ',')]
    pub k_values: Vec<usize>,

    #[arg(long = "mode", value_enum, value_delimiter = ',')]
    pub modes: Vec<RetrievalMode>,

    #[arg(long, default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    #[arg(long, value_enum, default_value_t = CorpusLevel::Paper)]
    pub level: CorpusLevel,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u32,

    #[arg(long, default_value_t = DEFAULT_WARMUPS)]
    pub warmups: usize,

    #[arg(long, env = "PAPERLENS_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[arg(long)]
    pub min_precision_lift: Option<f64>,

    #[arg(long)]
    pub p95_latency_ms: Option<f64>,

    #[arg(long)]
    pub noisy_drop_tolerance: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub skip_probes: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub enforce_gates: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    #[arg(long, env = "EMBEDDING_ENDPOINT")]
    pub embedding_endpoint: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long, env = "RERANK_ENDPOINT")]
    pub rerank_endpoint: Option<String>,

    /// Accepts `1` or `true`.
    #[arg(long, env = "SKIP_RERANK")]
    pub skip_rerank: Option<String>,

    #[arg(long, value_enum, default_value_t = RetrievalMode::Hybrid)]
    pub mode: RetrievalMode,

    #[arg(long, value_enum, default_value_t = CorpusLevel::Paper)]
    pub level: CorpusLevel,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub year_from: Option<i32>,

    #[arg(long)]
    pub year_to: Option<i32>,

    #[arg(long)]
    pub venue: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub source: Option<String>,

    #[arg(long, env = "PAPERLENS_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
