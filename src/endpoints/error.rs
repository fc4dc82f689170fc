use thiserror::Error;

use crate::util::truncate_chars;

/// Longest error text kept on a run record or in a log line.
pub const ERROR_TEXT_MAX_CHARS: usize = 500;

/// Failures talking to an external ranking, embedding, or rerank service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EndpointError {
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("{status} {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unsupported response shape: {0}")]
    UnsupportedShape(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("embedding vector missing")]
    MissingEmbedding,

    #[error("endpoint configuration error: {0}")]
    Config(String),

    /// In-process ranker failure, carrying the full context chain.
    #[error("ranker error: {0}")]
    Ranker(String),
}

impl EndpointError {
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate_chars(body, ERROR_TEXT_MAX_CHARS),
        }
    }

    /// Display text capped for storage on a run record.
    pub fn record_text(&self) -> String {
        truncate_chars(&self.to_string(), ERROR_TEXT_MAX_CHARS)
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

impl From<reqwest::Error> for EndpointError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EndpointError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
