//! Core types for the traffic engine (tables, metric pairs, alerts, output contracts).

use serde::Serialize;
use std::collections::HashMap;

use crate::breakdown::{AcquisitionBreakdown, KeywordTop};
use crate::metrics::Metric;

// ---------------------------------------------------------------------------
// Raw table (as supplied by a source)
// ---------------------------------------------------------------------------

/// One raw cell, as supplied. CSV sources only ever produce `Text` and `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
  Text(String),
  Number(f64),
  Empty,
}

impl RawValue {
  /// Cell text from a delimited source; an empty field is `Empty`.
  pub fn from_field(field: &str) -> Self {
    if field.is_empty() {
      Self::Empty
    } else {
      Self::Text(field.to_string())
    }
  }
}

impl From<&str> for RawValue {
  fn from(s: &str) -> Self {
    Self::Text(s.to_string())
  }
}

impl From<String> for RawValue {
  fn from(s: String) -> Self {
    Self::Text(s)
  }
}

impl From<f64> for RawValue {
  fn from(v: f64) -> Self {
    Self::Number(v)
  }
}

impl From<i64> for RawValue {
  fn from(v: i64) -> Self {
    Self::Number(v as f64)
  }
}

/// Rows in chronological order (oldest first). Column set discovered at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
  pub columns: Vec<String>,
  pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
  pub fn new(columns: Vec<String>) -> Self {
    Self {
      columns,
      rows: Vec::new(),
    }
  }

  /// Build from column names and rows of anything convertible to a raw cell.
  pub fn from_rows<V: Into<RawValue>>(columns: &[&str], rows: Vec<Vec<V>>) -> Self {
    let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect());
    for row in rows {
      table.push_row(row.into_iter().map(Into::into).collect());
    }
    table
  }

  /// Append a row; short rows are padded with `Empty`, long rows truncated.
  pub fn push_row(&mut self, mut row: Vec<RawValue>) {
    row.resize(self.columns.len(), RawValue::Empty);
    self.rows.push(row);
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

// ---------------------------------------------------------------------------
// Normalized table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
  Text,
  Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
  pub name: String,
  pub kind: ColumnKind,
}

/// A typed cell. TEXT columns hold `Text`, NUMERIC columns hold `Number`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
  Text(String),
  Number(f64),
}

impl Cell {
  /// Numeric reading of the cell; `None` for non-numeric text or non-finite values.
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(v) if v.is_finite() => Some(*v),
      Self::Number(_) => None,
      Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
  }

  pub fn as_text(&self) -> String {
    match self {
      Self::Text(s) => s.clone(),
      Self::Number(v) => v.to_string(),
    }
  }
}

/// One week of normalized metrics, addressed by its position in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekRow {
  pub position: usize,
  pub week: String,
  pub cells: HashMap<String, Cell>,
}

impl WeekRow {
  pub fn get(&self, column: &str) -> Option<&Cell> {
    self.cells.get(column)
  }
}

/// Same row order as the raw table; every column classified exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
  pub columns: Vec<Column>,
  /// The week identifier column used for selection, if the sheet has one.
  pub week_column: Option<String>,
  pub rows: Vec<WeekRow>,
}

impl NormalizedTable {
  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn row(&self, position: usize) -> Option<&WeekRow> {
    self.rows.get(position)
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.columns.iter().any(|c| c.name == name)
  }

  pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
    self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
  }

  /// Week labels in table (chronological) order.
  pub fn week_labels(&self) -> Vec<String> {
    self.rows.iter().map(|r| r.week.clone()).collect()
  }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Current value and previous value; previous is absent without a prior row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPair {
  pub current: f64,
  pub previous: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Surge,
  Drop,
}

/// A week-over-week change that met its metric's threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
  pub metric: Metric,
  pub label: String,
  pub previous: f64,
  pub current: f64,
  /// Signed change in percent ((curr - prev) / prev * 100).
  pub change_pct: f64,
  pub threshold: f64,
  pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
  /// The resolved week is the first one; nothing to compare against.
  NoBaseline,
  Alerts,
  Stable,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiDelta {
  pub metric: Metric,
  pub label: String,
  pub current: f64,
  pub previous: Option<f64>,
  pub percent_delta: String,
  pub abs_delta: String,
}

/// Fixed metric projection of one trailing week, integer-cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSnapshot {
  pub week: String,
  pub broadcast_pv: i64,
  pub news_pv: i64,
  pub broadcast_uv: i64,
  pub app_downloads: i64,
  pub total_members: i64,
  pub converted_members: i64,
  pub new_members: i64,
  pub churned_members: i64,
}

/// Self-contained payload for the narrative generator. Never mutated after build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceSummary {
  pub report_id: String,
  pub week: String,
  pub has_previous: bool,
  pub kpis: Vec<KpiDelta>,
  pub alerts: Vec<Alert>,
  pub window: usize,
  pub trailing: Vec<WeekSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiEntry {
  pub metric: Metric,
  pub label: String,
  /// Display value with thousands separators.
  pub value: String,
  pub delta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiPanel {
  pub title: String,
  pub entries: Vec<KpiEntry>,
}

/// Everything one computation cycle produces for a selected week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
  pub week: String,
  /// Whether the requested week was found (false means the latest-week fallback).
  pub selection_matched: bool,
  pub status: AlertStatus,
  pub panels: Vec<KpiPanel>,
  pub acquisition: AcquisitionBreakdown,
  pub keywords: KeywordTop,
  pub summary: EvidenceSummary,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for a failed cycle or narrative request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
