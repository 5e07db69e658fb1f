//! JSON-lines input for batch evaluation.
//!
//! One object per line: `{"question": "...", "response": "...", "reference": "..."}`,
//! with `question` optional. Blank lines are ignored.

use anyhow::{Context, Result};
use rag_eval_core::EvaluationInput;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A line that could not be turned into an input.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchInputs {
    pub inputs: Vec<EvaluationInput>,
    pub rejected: Vec<RejectedLine>,
}

pub fn parse_inputs(reader: impl BufRead) -> Result<BatchInputs> {
    let mut batch = BatchInputs::default();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_number))?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<EvaluationInput>(&line) {
            Ok(input) => batch.inputs.push(input),
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Skipping invalid batch line");
                batch.rejected.push(RejectedLine {
                    line: line_number,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(batch)
}

pub fn load_inputs(path: &Path) -> Result<BatchInputs> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_inputs(BufReader::new(file))
}
