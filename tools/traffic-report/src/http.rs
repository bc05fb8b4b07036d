//! HTTP table source (blocking; one request per cache miss).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;
use traffic_engine::{EngineError, TableSource};

pub struct HttpSource {
  client: Client,
}

impl HttpSource {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("building HTTP client")?;
    Ok(Self { client })
  }
}

impl TableSource for HttpSource {
  fn fetch(&self, location: &str) -> Result<String, EngineError> {
    debug!(location, "fetching sheet");
    self
      .client
      .get(location)
      .send()
      .and_then(|resp| resp.error_for_status())
      .and_then(|resp| resp.text())
      .map_err(|e| EngineError::source_unavailable(location, &e.to_string()))
  }
}

/// Whether `location` should be fetched over HTTP rather than read from disk.
pub fn is_url(location: &str) -> bool {
  let lower = location.trim_start().to_ascii_lowercase();
  lower.starts_with("http://") || lower.starts_with("https://")
}
