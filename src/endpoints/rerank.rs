use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{build_client, post_json, shape_summary};
use super::{EndpointError, Reranker};

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RerankResponse {
    Scores { scores: Vec<f64> },
    Unsupported(Value),
}

/// Cross-encoder style rerank service taking `{query, documents}`.
#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: Client,
    endpoint: Option<String>,
    disabled: bool,
}

impl HttpReranker {
    /// A missing or blank endpoint yields a reranker that never scores.
    pub fn new(
        endpoint: Option<&str>,
        disabled: bool,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            disabled,
        })
    }

    pub fn is_active(&self) -> bool {
        self.endpoint.is_some() && !self.disabled
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
    ) -> Result<Option<Vec<f64>>, EndpointError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Ok(None);
        };
        if self.disabled || documents.is_empty() {
            return Ok(None);
        }

        let request = RerankRequest { query, documents };
        let value = post_json(&self.client, endpoint, &request, None).await?;
        match serde_json::from_value::<RerankResponse>(value)? {
            RerankResponse::Scores { scores } => Ok(Some(scores)),
            RerankResponse::Unsupported(other) => {
                Err(EndpointError::UnsupportedShape(shape_summary(&other)))
            }
        }
    }
}

/// `SKIP_RERANK` accepts `1` or `true`.
pub fn rerank_disabled_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_flag_accepts_one_and_true() {
        assert!(rerank_disabled_flag(Some("1")));
        assert!(rerank_disabled_flag(Some("true")));
        assert!(rerank_disabled_flag(Some(" TRUE ")));
        assert!(!rerank_disabled_flag(Some("0")));
        assert!(!rerank_disabled_flag(Some("yes")));
        assert!(!rerank_disabled_flag(None));
    }

    #[tokio::test]
    async fn inactive_reranker_returns_none_without_calling_out() {
        let timeout = Duration::from_millis(100);
        let documents = vec!["doc".to_string()];

        let no_endpoint = HttpReranker::new(None, false, timeout).expect("client");
        assert!(!no_endpoint.is_active());
        assert_eq!(
            no_endpoint.rerank("q", &documents).await.expect("no call"),
            None
        );

        let disabled =
            HttpReranker::new(Some("http://127.0.0.1:9/rerank"), true, timeout).expect("client");
        assert_eq!(disabled.rerank("q", &documents).await.expect("no call"), None);

        let enabled =
            HttpReranker::new(Some("http://127.0.0.1:9/rerank"), false, timeout).expect("client");
        assert_eq!(enabled.rerank("q", &[]).await.expect("no call"), None);
    }
}
