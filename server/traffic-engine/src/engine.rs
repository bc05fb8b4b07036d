//! Core engine: one computation cycle from a raw sheet to a weekly report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::breakdown;
use crate::config::Config;
use crate::error::EngineError;
use crate::metrics::ResolvedRegistry;
use crate::normalize;
use crate::source::{TableCache, TableSource};
use crate::summary;
use crate::surge;
use crate::trend::{self, Trend, TrendRange};
use crate::types::*;
use crate::week;

/// The analytics engine. The table cache is its only state across cycles.
pub struct Engine {
  config: Config,
  cache: TableCache,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      cache: TableCache::new(),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Fetch (or reuse) the sheet at `location` and normalize it.
  pub fn load(
    &mut self,
    source: &dyn TableSource,
    location: &str,
    now: DateTime<Utc>,
  ) -> Result<NormalizedTable, EngineError> {
    let raw: Arc<RawTable> = self
      .cache
      .get_or_fetch(source, location, self.config.cache_ttl, now)?;
    self.prepare(&raw)
  }

  /// Normalize a raw table, rejecting sheets too short for a week-over-week delta.
  pub fn prepare(&self, raw: &RawTable) -> Result<NormalizedTable, EngineError> {
    let table = normalize::normalize(raw, &self.config);
    if table.len() < self.config.min_rows {
      return Err(EngineError::InsufficientHistory {
        rows: table.len(),
        required: self.config.min_rows,
      });
    }
    Ok(table)
  }

  /// Week labels for selection, most recent first.
  pub fn weeks(&self, table: &NormalizedTable) -> Vec<String> {
    week::week_options(table)
  }

  /// Compute KPIs, alerts, breakdowns, and the evidence summary for one week.
  ///
  /// `selected_week` of `None`, or a label not in the table, means the latest week.
  pub fn analyze(
    &self,
    table: &NormalizedTable,
    selected_week: Option<&str>,
  ) -> Result<WeeklyReport, EngineError> {
    let resolution =
      week::resolve(table, selected_week).ok_or_else(|| EngineError::InsufficientHistory {
        rows: 0,
        required: self.config.min_rows,
      })?;
    let current = resolution.current;
    let previous = resolution.previous;

    let registry = ResolvedRegistry::resolve(table);
    let alerts = surge::detect_all(&registry, current, previous, &self.config.surge_rules);
    let status = surge::status(previous, &alerts);
    let panels = summary::panels(&registry, current, previous);
    let acquisition = breakdown::acquisition(table, current);
    let keywords = breakdown::keyword_top3(table, current);
    let summary = summary::build(
      table,
      &registry,
      current,
      previous,
      alerts,
      self.config.evidence_window,
    );

    info!(
      week = %current.week,
      matched = resolution.matched,
      status = ?status,
      alerts = summary.alerts.len(),
      report_id = %summary.report_id,
      "weekly report assembled"
    );

    Ok(WeeklyReport {
      week: current.week.clone(),
      selection_matched: resolution.matched,
      status,
      panels,
      acquisition,
      keywords,
      summary,
    })
  }

  /// Trend series for the standard metrics over `range`.
  pub fn trend(&self, table: &NormalizedTable, range: TrendRange, selected_week: &str) -> Trend {
    let registry = ResolvedRegistry::resolve(table);
    trend::trend(table, &registry, range, &trend::TREND_METRICS, selected_week)
  }
}
