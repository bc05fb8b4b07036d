//! Normalize a raw sheet into a typed table.
//!
//! Column names are trimmed, then each column is classified once:
//! - TEXT: week/date identifiers, and rank columns whose name ends with a rank
//!   marker and mentions a keyword/article (these hold literal names).
//! - NUMERIC: everything else. Commas are stripped, then percent signs, then the
//!   remainder is parsed; anything unparseable (or empty) becomes 0.
//!
//! Normalization never fails. Unknown text columns read as 0, same as a
//! missing metric; the two cases are indistinguishable downstream.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::types::*;

/// Normalize a raw table. Total: bad cells degrade to 0, never to an error.
pub fn normalize(raw: &RawTable, config: &Config) -> NormalizedTable {
  let columns: Vec<Column> = raw
    .columns
    .iter()
    .map(|name| {
      let name = name.trim().to_string();
      let kind = classify(&name, config);
      Column { name, kind }
    })
    .collect();

  let week_column = config
    .week_columns
    .iter()
    .find(|w| columns.iter().any(|c| &c.name == *w))
    .cloned();

  let mut coerced = 0usize;
  let rows: Vec<WeekRow> = raw
    .rows
    .iter()
    .enumerate()
    .map(|(position, raw_row)| {
      let mut cells = HashMap::with_capacity(columns.len());
      for (idx, column) in columns.iter().enumerate() {
        let value = raw_row.get(idx).unwrap_or(&RawValue::Empty);
        let cell = match column.kind {
          ColumnKind::Text => Cell::Text(text_value(value)),
          ColumnKind::Numeric => {
            let (number, clean) = coerce_numeric(value);
            if !clean {
              coerced += 1;
            }
            Cell::Number(number)
          }
        };
        // Duplicate names after trimming: the leftmost column wins.
        cells.entry(column.name.clone()).or_insert(cell);
      }
      let week = week_column
        .as_ref()
        .and_then(|w| cells.get(w))
        .map(Cell::as_text)
        .unwrap_or_default();
      WeekRow {
        position,
        week,
        cells,
      }
    })
    .collect();

  debug!(
    rows = rows.len(),
    columns = columns.len(),
    coerced,
    week_column = week_column.as_deref().unwrap_or("-"),
    "normalized table"
  );

  NormalizedTable {
    columns,
    week_column,
    rows,
  }
}

/// TEXT iff the name is a week identifier, or a keyword/article rank column.
pub fn classify(name: &str, config: &Config) -> ColumnKind {
  if config.week_columns.iter().any(|w| w == name) {
    return ColumnKind::Text;
  }
  let is_rank = config.rank_suffixes.iter().any(|s| name.ends_with(s.as_str()));
  let has_marker = config.rank_markers.iter().any(|m| name.contains(m.as_str()));
  if is_rank && has_marker {
    ColumnKind::Text
  } else {
    ColumnKind::Numeric
  }
}

/// Strip commas, then percent signs, then parse. `None` when nothing numeric remains.
pub fn parse_numeric(raw: &str) -> Option<f64> {
  let stripped = raw.replace(',', "").replace('%', "");
  stripped
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
}

/// Numeric value of a raw cell and whether it parsed cleanly (empty counts as clean).
pub fn coerce_numeric(value: &RawValue) -> (f64, bool) {
  match value {
    RawValue::Number(v) if v.is_finite() => (*v, true),
    RawValue::Number(_) => (0.0, false),
    RawValue::Empty => (0.0, true),
    RawValue::Text(s) if s.trim().is_empty() => (0.0, true),
    RawValue::Text(s) => match parse_numeric(s) {
      Some(v) => (v, true),
      None => (0.0, false),
    },
  }
}

fn text_value(value: &RawValue) -> String {
  match value {
    RawValue::Text(s) => s.trim().to_string(),
    RawValue::Number(v) => v.to_string(),
    RawValue::Empty => String::new(),
  }
}
