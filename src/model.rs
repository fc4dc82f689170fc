use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const QUERY_MAX_LENGTH: usize = 500;
pub const VENUE_MAX_LENGTH: usize = 200;
pub const SUBJECT_MAX_LENGTH: usize = 100;
pub const SOURCE_MAX_LENGTH: usize = 50;

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Lexical,
    Semantic,
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn needs_embedding(self) -> bool {
        !matches!(self, Self::Lexical)
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorpusLevel {
    #[default]
    Paper,
    Chunk,
}

impl CorpusLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Chunk => "chunk",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryBucket {
    Keyword,
    Conceptual,
    Longtail,
    Noisy,
}

impl QueryBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Conceptual => "conceptual",
            Self::Longtail => "longtail",
            Self::Noisy => "noisy",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySplit {
    Train,
    Val,
    Test,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.year_from.is_none()
            && self.year_to.is_none()
            && self.venue.is_none()
            && self.subject.is_none()
            && self.source.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.year_from, self.year_to)
            && from > to
        {
            bail!("yearFrom cannot be greater than yearTo ({from} > {to})");
        }

        let limits = [
            ("venue", self.venue.as_deref(), VENUE_MAX_LENGTH),
            ("subject", self.subject.as_deref(), SUBJECT_MAX_LENGTH),
            ("source", self.source.as_deref(), SOURCE_MAX_LENGTH),
        ];
        for (name, value, max) in limits {
            if let Some(value) = value
                && value.chars().count() > max
            {
                bail!("{name} filter exceeds {max} characters");
            }
        }

        Ok(())
    }
}

/// One evaluation query with its ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    #[serde(rename = "q")]
    pub text: String,
    pub bucket: QueryBucket,
    pub relevant_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<QuerySplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetTargets {
    #[serde(
        default,
        rename = "precision5LiftOverBm25",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_precision_lift: Option<f64>,
    #[serde(default, rename = "p95LatencyMs", skip_serializing_if = "Option::is_none")]
    pub p95_latency_ms: Option<f64>,
    #[serde(
        default,
        rename = "noisyDropTolerance",
        skip_serializing_if = "Option::is_none"
    )]
    pub noisy_drop_tolerance: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub buckets: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<DatasetTargets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_values: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DatasetMeta>,
    pub queries: Vec<Query>,
}

/// One (query, mode, k, run) observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub query_id: String,
    pub bucket: QueryBucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_tag: Option<String>,
    pub mode: RetrievalMode,
    pub run_index: usize,
    pub k: usize,
    pub latency_ms: f64,
    pub retrieved_ids: Vec<String>,
    pub relevant_ids: Vec<String>,
    pub precision: f64,
    pub recall: f64,
    pub mrr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    pub fn pair_key(&self) -> (String, usize) {
        (self.query_id.clone(), self.run_index)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
