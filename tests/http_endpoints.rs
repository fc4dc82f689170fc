//! HTTP adapter behavior against a local mock server.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

use paperlens::config::BenchmarkConfig;
use paperlens::endpoints::{
    Embedder, EndpointError, HttpEmbedder, HttpRankingEndpoint, HttpReranker, RankingEndpoint,
    Reranker, SearchRequest,
};
use paperlens::eval::{BenchmarkRunner, parse_dataset};
use paperlens::model::{CorpusLevel, RetrievalMode};

const TIMEOUT: Duration = Duration::from_secs(5);

fn hybrid_request(text: &str, limit: usize) -> SearchRequest {
    SearchRequest {
        limit: Some(limit),
        mode: Some(RetrievalMode::Hybrid),
        level: Some(CorpusLevel::Chunk),
        ..SearchRequest::new(text)
    }
}

#[tokio::test]
async fn ranking_endpoint_posts_request_and_reads_ids() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .match_header("x-api-key", "secret")
        .match_body(Matcher::PartialJson(json!({
            "q": "protein folding",
            "limit": 10,
            "mode": "hybrid",
            "level": "chunk"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results":[{"id":"p1","title":"A"},{"id":"p7"}],"meta":{"took":4}}"#)
        .create_async()
        .await;

    let endpoint =
        HttpRankingEndpoint::new(&format!("{}/", server.url()), Some("secret".into()), TIMEOUT)
            .expect("client builds");
    assert_eq!(endpoint.search_url(), format!("{}/search", server.url()));

    let ranked = endpoint
        .search(&hybrid_request("protein folding", 10))
        .await
        .expect("search succeeds");
    assert_eq!(ranked.ids, vec!["p1".to_string(), "p7".to_string()]);
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthenticated_copy_sends_no_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .match_header("x-api-key", Matcher::Missing)
        .with_status(401)
        .with_body("missing api key")
        .create_async()
        .await;

    let endpoint = HttpRankingEndpoint::new(&server.url(), Some("secret".into()), TIMEOUT)
        .expect("client builds");
    let err = endpoint
        .without_api_key()
        .search(&SearchRequest::new("probe"))
        .await
        .expect_err("unauthorized");

    assert_eq!(err.to_string(), "401 missing api key");
    mock.assert_async().await;
}

#[tokio::test]
async fn rate_limited_status_is_recognized() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/search")
        .with_status(429)
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let endpoint = HttpRankingEndpoint::new(&server.url(), None, TIMEOUT).expect("client builds");
    let err = endpoint
        .search(&SearchRequest::new("burst"))
        .await
        .expect_err("rate limited");
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn long_error_bodies_are_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/search")
        .with_status(500)
        .with_body("x".repeat(2_000))
        .create_async()
        .await;

    let endpoint = HttpRankingEndpoint::new(&server.url(), None, TIMEOUT).expect("client builds");
    let err = endpoint
        .search(&SearchRequest::new("boom"))
        .await
        .expect_err("server error");
    assert!(err.record_text().chars().count() <= 500);
    assert!(err.record_text().starts_with("500 xxx"));
}

#[tokio::test]
async fn unexpected_response_shapes_are_errors() {
    let mut server = mockito::Server::new_async().await;
    let _shape = server
        .mock("POST", "/search")
        .match_body(Matcher::PartialJson(json!({ "q": "odd" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"hits":[]}"#)
        .create_async()
        .await;
    let _failure = server
        .mock("POST", "/search")
        .match_body(Matcher::PartialJson(json!({ "q": "failing" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"index offline"}"#)
        .create_async()
        .await;

    let endpoint = HttpRankingEndpoint::new(&server.url(), None, TIMEOUT).expect("client builds");

    let err = endpoint
        .search(&SearchRequest::new("odd"))
        .await
        .expect_err("unknown shape");
    assert!(matches!(err, EndpointError::UnsupportedShape(ref text) if text.contains("hits")));

    let err = endpoint
        .search(&SearchRequest::new("failing"))
        .await
        .expect_err("service error");
    assert!(err.to_string().contains("index offline"));
}

#[tokio::test]
async fn embedder_sends_model_and_inputs() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embed")
        .match_body(Matcher::Json(json!({
            "model": "bge-base-en-v1.5",
            "inputs": ["graph transformers"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"embedding":[0.25,-0.5,1.0]}]}"#)
        .create_async()
        .await;

    let embedder = HttpEmbedder::new(
        &format!("{}/embed", server.url()),
        "bge-base-en-v1.5",
        TIMEOUT,
    )
    .expect("client builds");
    let vector = embedder
        .embed("graph transformers")
        .await
        .expect("embedding returned");

    assert_eq!(vector, vec![0.25_f32, -0.5, 1.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedder_reports_missing_vector() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/embed")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"embeddings":[]}"#)
        .create_async()
        .await;

    let embedder =
        HttpEmbedder::new(&format!("{}/embed", server.url()), "m", TIMEOUT).expect("client");
    let err = embedder.embed("anything").await.expect_err("no vector");
    assert_eq!(err, EndpointError::MissingEmbedding);
}

#[test]
fn blank_endpoints_are_configuration_errors() {
    assert!(matches!(
        HttpEmbedder::new("  ", "m", TIMEOUT),
        Err(EndpointError::Config(_))
    ));
    assert!(matches!(
        HttpRankingEndpoint::new("", None, TIMEOUT),
        Err(EndpointError::Config(_))
    ));
}

#[tokio::test]
async fn reranker_posts_documents_and_returns_scores() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rerank")
        .match_body(Matcher::Json(json!({
            "query": "sparse attention",
            "documents": ["Longformer", "BigBird"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"scores":[0.2,0.9]}"#)
        .create_async()
        .await;

    let endpoint = format!("{}/rerank", server.url());
    let reranker = HttpReranker::new(Some(&endpoint), false, TIMEOUT).expect("client builds");
    assert!(reranker.is_active());

    let documents = vec!["Longformer".to_string(), "BigBird".to_string()];
    let scores = reranker
        .rerank("sparse attention", &documents)
        .await
        .expect("rerank succeeds");
    assert_eq!(scores, Some(vec![0.2, 0.9]));
    mock.assert_async().await;
}

#[tokio::test]
async fn reranker_surfaces_service_failures() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/rerank")
        .with_status(503)
        .with_body("warming up")
        .create_async()
        .await;

    let endpoint = format!("{}/rerank", server.url());
    let reranker = HttpReranker::new(Some(&endpoint), false, TIMEOUT).expect("client builds");
    let err = reranker
        .rerank("q", &["doc".to_string()])
        .await
        .expect_err("service unavailable");
    assert_eq!(
        err,
        EndpointError::Status {
            status: 503,
            body: "warming up".to_string()
        }
    );
}

#[tokio::test]
async fn stalled_service_is_recorded_as_a_sweep_timeout() {
    // Accepted by the kernel backlog, never answered.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let config = BenchmarkConfig {
        base_url: format!("http://{}", listener.local_addr().expect("local addr")),
        k_values: vec![1],
        modes: vec![RetrievalMode::Lexical],
        runs: 1,
        warmups: 0,
        timeout_ms: 200,
        ..BenchmarkConfig::default()
    };
    let endpoint = HttpRankingEndpoint::new(&config.base_url, None, config.client_timeout())
        .expect("client builds");
    let runner = BenchmarkRunner::new(Arc::new(endpoint), config).expect("valid config");
    let dataset = parse_dataset(
        r#"{ "queries": [
            { "id": "q1", "q": "stalled", "relevantIds": ["p1"], "bucket": "keyword" }
        ] }"#,
    )
    .expect("dataset parses");

    let run = runner.run(&dataset).await.expect("sweep completes");
    assert_eq!(
        run.records[0].error.as_deref(),
        Some("request timed out after 200 ms")
    );
    drop(listener);
}
