//! Structured error types for the traffic engine.

use thiserror::Error;

/// Failures that end one computation cycle.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("source unavailable: {location}: {reason}")]
  SourceUnavailable { location: String, reason: String },

  #[error("insufficient history: {rows} row(s), need at least {required}")]
  InsufficientHistory { rows: usize, required: usize },

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("csv: {0}")]
  Csv(#[from] csv::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn source_unavailable(location: &str, reason: &str) -> Self {
    Self::SourceUnavailable {
      location: location.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}

/// Failures of the narrative generator. These disable only the narrative.
#[derive(Debug, Error)]
pub enum NarrativeError {
  #[error("missing API key in {0}")]
  MissingApiKey(String),

  #[error("request failed: {0}")]
  Request(String),

  #[error("invalid response: {0}")]
  InvalidResponse(String),

  #[error("payload encoding: {0}")]
  Payload(#[from] serde_json::Error),

  #[error("{0}")]
  Unavailable(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_unavailable_names_location() {
    let err = EngineError::source_unavailable("https://sheet/x.csv", "timeout");
    assert_eq!(
      err.to_string(),
      "source unavailable: https://sheet/x.csv: timeout"
    );
  }

  #[test]
  fn insufficient_history_message() {
    let err = EngineError::InsufficientHistory { rows: 1, required: 2 };
    assert!(err.to_string().contains("1 row(s)"));
  }
}
