//! Table sources, CSV parsing, and the time-bounded table cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::types::{RawTable, RawValue};

/// Something that can hand back the delimited text of a weekly sheet.
pub trait TableSource {
  fn fetch(&self, location: &str) -> Result<String, EngineError>;
}

/// Reads a sheet from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl TableSource for FileSource {
  fn fetch(&self, location: &str) -> Result<String, EngineError> {
    std::fs::read_to_string(location)
      .map_err(|e| EngineError::source_unavailable(location, &e.to_string()))
  }
}

/// Parse delimited text with a header row. Short rows are padded with empty cells.
pub fn parse_csv(text: &str) -> Result<RawTable, EngineError> {
  let mut reader = ReaderBuilder::new()
    .flexible(true)
    .from_reader(text.as_bytes());

  let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
  let mut table = RawTable::new(columns);
  for record in reader.records() {
    let record = record?;
    table.push_row(record.iter().map(RawValue::from_field).collect());
  }
  Ok(table)
}

/// One cached table.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub key: String,
  pub table: Arc<RawTable>,
  pub fetched_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
  pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }
}

/// Fetched tables keyed by source location; entries only ever expire.
#[derive(Debug, Default)]
pub struct TableCache {
  entries: HashMap<String, CacheEntry>,
}

impl TableCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cache key for a location: 32 hex chars of its blake3 digest.
  pub fn key_for(location: &str) -> String {
    let hex = blake3::hash(location.as_bytes()).to_hex();
    hex[..32].to_string()
  }

  /// Return the cached table for `location` if still fresh at `now`, else fetch and parse it.
  pub fn get_or_fetch(
    &mut self,
    source: &dyn TableSource,
    location: &str,
    ttl: Duration,
    now: DateTime<Utc>,
  ) -> Result<Arc<RawTable>, EngineError> {
    let key = Self::key_for(location);

    if let Some(entry) = self.entries.get(&key) {
      if entry.is_fresh(now) {
        debug!(key = %key, fetched_at = %entry.fetched_at, "table cache hit");
        return Ok(Arc::clone(&entry.table));
      }
      debug!(key = %key, "table cache entry expired");
    }
    self.entries.remove(&key);

    let text = source.fetch(location)?;
    let table = Arc::new(parse_csv(&text)?);
    info!(
      key = %key,
      rows = table.len(),
      columns = table.columns.len(),
      "fetched table"
    );

    self.entries.insert(
      key.clone(),
      CacheEntry {
        key,
        table: Arc::clone(&table),
        fetched_at: now,
        expires_at: now + ttl,
      },
    );
    Ok(table)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
