use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Model unavailable: {model}: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Serialisable discriminant of [`EvalError`], stored on failed metric results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    ModelUnavailable,
    Computation,
    Validation,
    Configuration,
    Serialization,
}

impl EvalError {
    pub fn model_unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        EvalError::ModelUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::EmptyInput(_) => ErrorKind::EmptyInput,
            EvalError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            EvalError::Computation(_) => ErrorKind::Computation,
            EvalError::Validation(_) => ErrorKind::Validation,
            EvalError::Configuration(_) => ErrorKind::Configuration,
            EvalError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::Computation => "computation",
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Serialization => "serialization",
        };
        f.write_str(label)
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for EvalError {
    fn from(err: validator::ValidationErrors) -> Self {
        EvalError::Validation(err.to_string())
    }
}
