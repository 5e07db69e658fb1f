use pretty_assertions::assert_eq;
use rag_eval_core::{
    EmbeddingBackend, ErrorKind, EvaluationInput, LanguageModelBackend, MetricKind,
    MetricSelection, MetricStatus, TextClassifier,
};
use rag_eval_lab::{
    build_aggregator, classifier, embedding_model, BackendsConfig, EndpointConfig,
    HttpClassifier, HttpEmbeddingBackend, HttpLanguageModel, HttpModelClient, LabConfig,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer, model: &str) -> EndpointConfig {
    EndpointConfig {
        url: server.uri(),
        model: model.to_string(),
        timeout_secs: 5,
    }
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

// ===== Client =====

#[tokio::test]
async fn test_health_probe_succeeds() {
    let server = healthy_server().await;
    let client = HttpModelClient::new(&endpoint(&server, "probe")).unwrap();

    assert!(client.health().await.is_ok());
    assert_eq!(client.model(), "probe");
}

#[tokio::test]
async fn test_health_probe_failure_is_model_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = HttpEmbeddingBackend::connect(&endpoint(&server, "down"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
}

#[test]
fn test_invalid_url_is_configuration_error() {
    let endpoint = EndpointConfig {
        url: "not a url".to_string(),
        model: "m".to_string(),
        timeout_secs: 5,
    };

    let err = HttpModelClient::new(&endpoint).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ===== Embedding =====

#[tokio::test]
async fn test_embed_batch_success() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_partial_json(json!({"model": "mini", "texts": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpEmbeddingBackend::connect(&endpoint(&server, "mini"))
        .await
        .unwrap();
    let vectors = backend
        .embed_batch(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();

    assert_eq!(backend.model_id(), "mini");
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn test_embed_count_mismatch_is_computation_error() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let backend = HttpEmbeddingBackend::connect(&endpoint(&server, "short"))
        .await
        .unwrap();
    let err = backend
        .embed_batch(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Computation);
}

#[tokio::test]
async fn test_server_error_is_model_unavailable() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = HttpEmbeddingBackend::connect(&endpoint(&server, "flaky"))
        .await
        .unwrap();
    let err = backend.embed("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_malformed_response_is_computation_error() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vectors": []})))
        .mount(&server)
        .await;

    let backend = HttpEmbeddingBackend::connect(&endpoint(&server, "odd"))
        .await
        .unwrap();
    let err = backend.embed("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Computation);
}

// ===== Language Model and Classifier =====

#[tokio::test]
async fn test_log_likelihood_success() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/log_likelihood"))
        .and(body_partial_json(json!({"model": "gpt2", "text": "hello world"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "log_probs": [-1.5, -0.5]
        })))
        .mount(&server)
        .await;

    let backend = HttpLanguageModel::connect(&endpoint(&server, "gpt2"))
        .await
        .unwrap();
    let log_probs = backend.log_likelihood("hello world").await.unwrap();

    assert_eq!(log_probs, vec![-1.5, -0.5]);
}

#[tokio::test]
async fn test_classify_success() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_partial_json(json!({"model": "toxic-bert"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"probability": 0.25})))
        .mount(&server)
        .await;

    let backend = HttpClassifier::connect(&endpoint(&server, "toxic-bert"))
        .await
        .unwrap();

    assert_eq!(backend.classify("some text").await.unwrap(), 0.25);
}

// ===== Lazy Loading =====

#[tokio::test]
async fn test_lazy_model_probes_health_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let model = classifier("bias", &endpoint(&server, "once"));
    for _ in 0..3 {
        let backend = model.get().await.unwrap();
        assert_eq!(backend.model_id(), "once");
    }
}

#[tokio::test]
async fn test_lazy_model_key_names_role_and_endpoint() {
    let server = MockServer::start().await;
    let model = embedding_model(&endpoint(&server, "mini"));

    assert_eq!(
        model.key().as_str(),
        format!("embedding:mini@{}", server.uri())
    );
}

// ===== Aggregator Wiring =====

#[tokio::test]
async fn test_build_aggregator_uses_http_embedding() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.6, 0.8], [0.6, 0.8]]
        })))
        .mount(&server)
        .await;

    let config = LabConfig {
        backends: BackendsConfig {
            embedding: Some(endpoint(&server, "wired")),
            ..BackendsConfig::default()
        },
        ..LabConfig::default()
    };
    let aggregator = build_aggregator(&config).unwrap();

    let input = EvaluationInput::new(None, "the cat sat", "the cat sat").unwrap();
    let report = aggregator
        .evaluate(
            input,
            &MetricSelection::Only(vec![MetricKind::SemanticSimilarity, MetricKind::Bias]),
        )
        .await;

    let similarity = report.result(MetricKind::SemanticSimilarity).unwrap();
    assert_eq!(similarity.status, MetricStatus::Ok);
    assert!((similarity.score().unwrap() - 1.0).abs() < 1e-6);

    let bias = report.result(MetricKind::Bias).unwrap();
    assert_eq!(bias.status, MetricStatus::Failed);
    assert_eq!(bias.error_kind, Some(ErrorKind::ModelUnavailable));
}

#[tokio::test]
async fn test_build_aggregator_offline_fallback() {
    let config = LabConfig {
        backends: BackendsConfig {
            offline_fallback: true,
            ..BackendsConfig::default()
        },
        ..LabConfig::default()
    };
    let aggregator = build_aggregator(&config).unwrap();

    let input = EvaluationInput::new(None, "a calm and kind reply", "a calm reply").unwrap();
    let report = aggregator
        .evaluate(
            input,
            &MetricSelection::Only(vec![MetricKind::Bias, MetricKind::Toxicity]),
        )
        .await;

    assert!(report.all_ok());
    assert_eq!(report.score(MetricKind::Toxicity), Some(0.0));
}
