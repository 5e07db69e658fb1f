use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::text::TextNormalizer;

/// One `(question, response, reference)` triple, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationInput {
    question: Option<String>,
    response: String,
    reference: String,
}

impl EvaluationInput {
    /// Rejects a response or reference that tokenizes to zero tokens.
    /// A blank question is treated as absent.
    pub fn new(
        question: Option<String>,
        response: impl Into<String>,
        reference: impl Into<String>,
    ) -> Result<Self> {
        let response = response.into();
        let reference = reference.into();
        let normalizer = TextNormalizer::default();

        if normalizer.token_count(&response) == 0 {
            return Err(EvalError::EmptyInput("response has no tokens".to_string()));
        }
        if normalizer.token_count(&reference) == 0 {
            return Err(EvalError::EmptyInput("reference has no tokens".to_string()));
        }

        let question = question.filter(|q| normalizer.token_count(q) > 0);

        Ok(Self {
            question,
            response,
            reference,
        })
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

#[derive(Deserialize)]
struct RawInput {
    #[serde(default)]
    question: Option<String>,
    response: String,
    reference: String,
}

/// Deserialising goes through the same validation as [`EvaluationInput::new`].
impl<'de> Deserialize<'de> for EvaluationInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawInput::deserialize(deserializer)?;
        EvaluationInput::new(raw.question, raw.response, raw.reference)
            .map_err(serde::de::Error::custom)
    }
}
