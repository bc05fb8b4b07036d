//! Gemini narrative generator (blocking `generateContent` call).

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::info;
use traffic_engine::{NarrativeError, NarrativePort, NarrativeRequest};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiNarrator {
  client: Client,
  api_key: String,
  model: String,
  api_base: String,
}

impl GeminiNarrator {
  pub fn from_env_key(
    api_key_env: &str,
    model: String,
    timeout: Duration,
  ) -> Result<Self, NarrativeError> {
    let api_key = env::var(api_key_env)
      .ok()
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
      .ok_or_else(|| NarrativeError::MissingApiKey(api_key_env.to_string()))?;
    Self::new(api_key, model, timeout)
  }

  pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, NarrativeError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| NarrativeError::Unavailable(e.to_string()))?;
    Ok(Self {
      client,
      api_key,
      model,
      api_base: GEMINI_API_BASE.to_string(),
    })
  }

  fn endpoint_url(&self) -> String {
    format!(
      "{}/models/{}:generateContent?key={}",
      self.api_base, self.model, self.api_key
    )
  }
}

impl NarrativePort for GeminiNarrator {
  fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
    let body = json!({
      "contents": [
        { "parts": [ { "text": request.prompt } ] }
      ]
    });

    let response: Value = self
      .client
      .post(self.endpoint_url())
      .json(&body)
      .send()
      .and_then(|resp| resp.error_for_status())
      .and_then(|resp| resp.json())
      .map_err(|e| NarrativeError::Request(e.without_url().to_string()))?;

    let text = extract_text(&response)?;
    info!(report_id = %request.report_id, model = %self.model, chars = text.len(), "narrative generated");
    Ok(text.to_string())
  }
}

/// `candidates[0].content.parts[0].text`, non-empty.
fn extract_text(response: &Value) -> Result<&str, NarrativeError> {
  response
    .pointer("/candidates/0/content/parts/0/text")
    .and_then(Value::as_str)
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| {
      NarrativeError::InvalidResponse("missing candidates[0].content.parts[0].text".to_string())
    })
}
