use config::{Config as ConfigLoader, Environment, File};
use rag_eval_core::{EvalError, EvaluatorConfig, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// A model served over HTTP.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn parsed_url(&self) -> Result<Url> {
        Url::parse(&self.url)
            .map_err(|e| EvalError::Configuration(format!("invalid endpoint url {}: {}", self.url, e)))
    }
}

/// Endpoints per backend role. Unset roles fall back to the offline
/// backends, or stay unavailable when there is none.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub embedding: Option<EndpointConfig>,
    pub language_model: Option<EndpointConfig>,
    pub bias: Option<EndpointConfig>,
    pub toxicity: Option<EndpointConfig>,
    /// Use the hashing embedder and lexicon classifiers for unset roles.
    pub offline_fallback: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub evaluator: EvaluatorConfig,
    pub logging: LoggingConfig,
    pub backends: BackendsConfig,
}

impl LabConfig {
    /// Layers `config/default`, `config/local`, an optional explicit file and
    /// `RAG_EVAL__` environment variables, later sources winning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("RAG_EVAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| EvalError::Configuration(e.to_string()))?;

        let lab: LabConfig = config
            .try_deserialize()
            .map_err(|e| EvalError::Configuration(e.to_string()))?;
        lab.validated()
    }

    pub fn validated(self) -> Result<Self> {
        let evaluator = self.evaluator.validated()?;
        for endpoint in [
            &self.backends.embedding,
            &self.backends.language_model,
            &self.backends.bias,
            &self.backends.toxicity,
        ]
        .into_iter()
        .flatten()
        {
            endpoint.parsed_url()?;
        }

        Ok(Self { evaluator, ..self })
    }
}
