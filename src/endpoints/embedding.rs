use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{build_client, post_json, shape_summary};
use super::{Embedder, EndpointError};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    inputs: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Batch { embeddings: Vec<Vec<f32>> },
    Data { data: Vec<EmbeddingDatum> },
    Single { vector: Vec<f32> },
    Unsupported(Value),
}

/// Text embedding service that answers `{model, inputs}` POSTs.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, EndpointError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(EndpointError::Config(
                "embedding endpoint is empty".to_string(),
            ));
        }

        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.to_string(),
            model: model.trim().to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EndpointError> {
        let request = EmbeddingRequest {
            model: &self.model,
            inputs: [text],
        };
        let value = post_json(&self.client, &self.endpoint, &request, None).await?;
        decode_embedding(value)
    }
}

fn decode_embedding(value: Value) -> Result<Vec<f32>, EndpointError> {
    let vector = match serde_json::from_value::<EmbeddingResponse>(value)? {
        EmbeddingResponse::Batch { embeddings } => embeddings.into_iter().next(),
        EmbeddingResponse::Data { data } => data.into_iter().next().map(|datum| datum.embedding),
        EmbeddingResponse::Single { vector } => Some(vector),
        EmbeddingResponse::Unsupported(other) => {
            return Err(EndpointError::UnsupportedShape(shape_summary(&other)));
        }
    };

    match vector {
        Some(vector) if !vector.is_empty() => Ok(vector),
        _ => Err(EndpointError::MissingEmbedding),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_every_supported_shape() {
        let batch = decode_embedding(json!({ "embeddings": [[0.1, 0.2], [0.3, 0.4]] }))
            .expect("batch shape");
        assert_eq!(batch, vec![0.1_f32, 0.2]);

        let data = decode_embedding(json!({ "data": [{ "embedding": [0.5, 0.6, 0.7] }] }))
            .expect("data shape");
        assert_eq!(data, vec![0.5_f32, 0.6, 0.7]);

        let single = decode_embedding(json!({ "vector": [1.0] })).expect("vector shape");
        assert_eq!(single, vec![1.0_f32]);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let err = decode_embedding(json!({ "output": [0.1] })).expect_err("unknown shape");
        assert!(matches!(err, EndpointError::UnsupportedShape(_)));
    }

    #[test]
    fn empty_vectors_count_as_missing() {
        let err = decode_embedding(json!({ "embeddings": [] })).expect_err("no rows");
        assert_eq!(err, EndpointError::MissingEmbedding);

        let err = decode_embedding(json!({ "vector": [] })).expect_err("empty vector");
        assert_eq!(err, EndpointError::MissingEmbedding);
    }
}
