use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{EndpointError, RankedIds, RankingEndpoint, SearchRequest};

pub fn build_client(timeout: Duration) -> Result<Client, EndpointError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| EndpointError::Config(format!("failed to build HTTP client: {err}")))
}

/// POSTs `body` as JSON and returns the parsed JSON response. Non-2xx
/// statuses become [`EndpointError::Status`] carrying the response text.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &B,
    api_key: Option<&str>,
) -> Result<Value, EndpointError> {
    let mut builder = client.post(url).json(body);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(EndpointError::status(status.as_u16(), &text));
    }

    let text = response.text().await?;
    serde_json::from_str::<Value>(&text).map_err(EndpointError::from)
}

#[derive(Debug, Deserialize)]
struct RankedItem {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Results { results: Vec<RankedItem> },
    Failure { error: Value },
    Unsupported(Value),
}

/// Ranking service reached over HTTP at `{base_url}/search`.
#[derive(Debug, Clone)]
pub struct HttpRankingEndpoint {
    client: Client,
    search_url: String,
    api_key: Option<String>,
}

impl HttpRankingEndpoint {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(EndpointError::Config("ranking base URL is empty".to_string()));
        }

        Ok(Self {
            client: build_client(timeout)?,
            search_url: format!("{base}/search"),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Same endpoint without credentials.
    pub fn without_api_key(&self) -> Self {
        Self {
            client: self.client.clone(),
            search_url: self.search_url.clone(),
            api_key: None,
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl RankingEndpoint for HttpRankingEndpoint {
    async fn search(&self, request: &SearchRequest) -> Result<RankedIds, EndpointError> {
        let value = post_json(
            &self.client,
            &self.search_url,
            request,
            self.api_key.as_deref(),
        )
        .await?;

        match serde_json::from_value::<SearchResponse>(value)? {
            SearchResponse::Results { results } => {
                debug!(count = results.len(), mode = %request.mode(), "ranking response");
                Ok(RankedIds {
                    ids: results.into_iter().map(|item| item.id).collect(),
                })
            }
            SearchResponse::Failure { error } => Err(EndpointError::UnsupportedShape(format!(
                "service reported error: {}",
                value_text(&error)
            ))),
            SearchResponse::Unsupported(other) => {
                Err(EndpointError::UnsupportedShape(shape_summary(&other)))
            }
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Short description of an unexpected JSON body for error messages.
pub(crate) fn shape_summary(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys = map.keys().map(String::as_str).collect::<Vec<&str>>();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
    }
}
