use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::model::Dataset;

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    let dataset = parse_dataset(&raw)
        .with_context(|| format!("invalid dataset: {}", path.display()))?;

    info!(
        path = %path.display(),
        queries = dataset.queries.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn parse_dataset(raw: &str) -> Result<Dataset> {
    let dataset = serde_json::from_str::<Dataset>(raw).context("failed to parse dataset json")?;
    validate_dataset(&dataset)?;
    Ok(dataset)
}

fn validate_dataset(dataset: &Dataset) -> Result<()> {
    if dataset.queries.is_empty() {
        bail!("dataset contains no queries");
    }

    let mut ids = HashSet::<&str>::new();
    for query in &dataset.queries {
        if query.id.trim().is_empty() {
            bail!("query with text {:?} has an empty id", query.text);
        }
        if !ids.insert(query.id.as_str()) {
            bail!("duplicate query id: {}", query.id);
        }
        if query.text.trim().is_empty() {
            bail!("query {} has empty text", query.id);
        }
        if query.relevant_ids.is_empty() {
            bail!("query {} has no relevant ids", query.id);
        }
        if let Some(filters) = query.filters.as_ref() {
            filters
                .validate()
                .with_context(|| format!("query {} has invalid filters", query.id))?;
        }
    }

    if let Some(k_values) = dataset.meta.as_ref().and_then(|meta| meta.k_values.as_ref())
        && k_values.contains(&0)
    {
        bail!("dataset meta kValues must be positive: {k_values:?}");
    }

    Ok(())
}
