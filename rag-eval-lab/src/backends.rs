//! Model backends served over HTTP with a JSON protocol.
//!
//! | role | request | response |
//! |------|---------|----------|
//! | embedding | `POST /embed {model, texts}` | `{embeddings: [[f32]]}` |
//! | language model | `POST /log_likelihood {model, text}` | `{log_probs: [f64]}` |
//! | classifier | `POST /classify {model, text}` | `{probability: f64}` |
//!
//! Every server must answer `GET /health` with a 2xx status; it is probed
//! once when the backend is first loaded.

use async_trait::async_trait;
use rag_eval_core::{
    EmbeddingBackend, EvalError, LanguageModelBackend, Result, TextClassifier,
};
use rag_eval_metrics::{LazyModel, MetricAggregator, ModelKey};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{EndpointConfig, LabConfig};

/// JSON client bound to one model endpoint.
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpModelClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        endpoint.parsed_url()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(endpoint.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| EvalError::model_unavailable(&endpoint.model, e.to_string()))?;

        Ok(Self {
            client,
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> EvalError {
        EvalError::model_unavailable(&self.model, reason.to_string())
    }

    pub async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            return Err(self.unavailable(format!("health check returned {}", response.status())));
        }
        Ok(())
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(model = %self.model, url = %url, "Calling model endpoint");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, %status, "Model endpoint returned an error");
            return Err(self.unavailable(format!("{} returned {}: {}", path, status, body)));
        }

        response.json::<T>().await.map_err(|e| {
            EvalError::Computation(format!("malformed response from {}: {}", self.model, e))
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct TextRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct LogLikelihoodResponse {
    log_probs: Vec<f64>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    probability: f64,
}

#[derive(Debug, Clone)]
pub struct HttpEmbeddingBackend {
    client: HttpModelClient,
}

impl HttpEmbeddingBackend {
    pub async fn connect(endpoint: &EndpointConfig) -> Result<Self> {
        let client = HttpModelClient::new(endpoint)?;
        client.health().await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EvalError::Computation("embedding response was empty".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response: EmbedResponse = self
            .client
            .post(
                "embed",
                &EmbedRequest {
                    model: self.client.model(),
                    texts,
                },
            )
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(EvalError::Computation(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    client: HttpModelClient,
}

impl HttpLanguageModel {
    pub async fn connect(endpoint: &EndpointConfig) -> Result<Self> {
        let client = HttpModelClient::new(endpoint)?;
        client.health().await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LanguageModelBackend for HttpLanguageModel {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn log_likelihood(&self, text: &str) -> Result<Vec<f64>> {
        let response: LogLikelihoodResponse = self
            .client
            .post(
                "log_likelihood",
                &TextRequest {
                    model: self.client.model(),
                    text,
                },
            )
            .await?;
        Ok(response.log_probs)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: HttpModelClient,
}

impl HttpClassifier {
    pub async fn connect(endpoint: &EndpointConfig) -> Result<Self> {
        let client = HttpModelClient::new(endpoint)?;
        client.health().await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn classify(&self, text: &str) -> Result<f64> {
        let response: ClassifyResponse = self
            .client
            .post(
                "classify",
                &TextRequest {
                    model: self.client.model(),
                    text,
                },
            )
            .await?;
        Ok(response.probability)
    }
}

fn endpoint_key(role: &str, endpoint: &EndpointConfig) -> ModelKey {
    ModelKey::new(role, &format!("{}@{}", endpoint.model, endpoint.url))
}

pub fn embedding_model(endpoint: &EndpointConfig) -> LazyModel<dyn EmbeddingBackend> {
    let endpoint = endpoint.clone();
    LazyModel::new(endpoint_key("embedding", &endpoint), move || {
        let endpoint = endpoint.clone();
        async move {
            let backend = HttpEmbeddingBackend::connect(&endpoint).await?;
            Ok::<_, EvalError>(Arc::new(backend) as Arc<dyn EmbeddingBackend>)
        }
    })
}

pub fn language_model(endpoint: &EndpointConfig) -> LazyModel<dyn LanguageModelBackend> {
    let endpoint = endpoint.clone();
    LazyModel::new(endpoint_key("language_model", &endpoint), move || {
        let endpoint = endpoint.clone();
        async move {
            let backend = HttpLanguageModel::connect(&endpoint).await?;
            Ok::<_, EvalError>(Arc::new(backend) as Arc<dyn LanguageModelBackend>)
        }
    })
}

pub fn classifier(role: &str, endpoint: &EndpointConfig) -> LazyModel<dyn TextClassifier> {
    let endpoint = endpoint.clone();
    LazyModel::new(endpoint_key(role, &endpoint), move || {
        let endpoint = endpoint.clone();
        async move {
            let backend = HttpClassifier::connect(&endpoint).await?;
            Ok::<_, EvalError>(Arc::new(backend) as Arc<dyn TextClassifier>)
        }
    })
}

/// Builds an aggregator with HTTP backends for every configured endpoint.
pub fn build_aggregator(config: &LabConfig) -> Result<MetricAggregator> {
    let backends = &config.backends;
    let mut builder = MetricAggregator::builder().config(config.evaluator.clone());

    if let Some(endpoint) = &backends.embedding {
        builder = builder.embedding(embedding_model(endpoint));
    }
    if let Some(endpoint) = &backends.language_model {
        builder = builder.language_model(language_model(endpoint));
    }
    if let Some(endpoint) = &backends.bias {
        builder = builder.bias_classifier(classifier("bias", endpoint));
    }
    if let Some(endpoint) = &backends.toxicity {
        builder = builder.toxicity_classifier(classifier("toxicity", endpoint));
    }
    if backends.offline_fallback {
        builder = builder.offline_backends();
    }

    builder.build()
}
