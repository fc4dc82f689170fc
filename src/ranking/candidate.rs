use serde::Serialize;

/// Identity of a fused result: the paper id plus the chunk id at chunk level.
pub type CandidateKey = (String, Option<i64>);

/// One row from a lexical or semantic candidate pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<i64>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    #[sqlx(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub source: Option<String>,
    pub snippet: Option<String>,
    #[serde(rename = "lexScore")]
    #[sqlx(rename = "lex_score")]
    pub lexical_score: Option<f64>,
    #[serde(rename = "semScore")]
    #[sqlx(rename = "sem_score")]
    pub semantic_score: Option<f64>,
}

impl Candidate {
    pub fn key(&self) -> CandidateKey {
        (self.id.clone(), self.chunk_id)
    }

    /// Text submitted to the reranker: title, then abstract, then snippet.
    pub fn rerank_text(&self) -> String {
        self.title
            .as_deref()
            .or(self.abstract_text.as_deref())
            .or(self.snippet.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    /// Folds a second sighting of the same key into `self`. Scores take the
    /// per-field maximum; metadata stays from the first sighting.
    pub(crate) fn absorb_scores(&mut self, other: &Candidate) {
        self.lexical_score = max_score(self.lexical_score, other.lexical_score);
        self.semantic_score = max_score(self.semantic_score, other.semantic_score);
    }
}

pub(crate) fn max_score(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedResult {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub hybrid_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f64>,
}

impl FusedResult {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}
