//! Trend windows: the last N weeks projected to per-metric series.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::EngineError;
use crate::metrics::{Metric, ResolvedRegistry};
use crate::summary::trailing_rows;
use crate::types::NormalizedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendRange {
  Year,
  HalfYear,
  Quarter,
}

impl TrendRange {
  pub fn weeks(self) -> usize {
    match self {
      Self::Year => 52,
      Self::HalfYear => 26,
      Self::Quarter => 13,
    }
  }
}

impl FromStr for TrendRange {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "year" | "1y" | "52" => Ok(Self::Year),
      "half" | "half-year" | "6m" | "26" => Ok(Self::HalfYear),
      "quarter" | "3m" | "13" => Ok(Self::Quarter),
      _ => Err(EngineError::validation("range", "expected year|half|quarter")),
    }
  }
}

impl fmt::Display for TrendRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Year => "year",
      Self::HalfYear => "half",
      Self::Quarter => "quarter",
    };
    f.write_str(s)
  }
}

/// Metrics charted in trend views.
pub const TREND_METRICS: [Metric; 9] = [
  Metric::NewsPv,
  Metric::NewsUv,
  Metric::NewsAppDownloads,
  Metric::BroadcastPv,
  Metric::BroadcastUv,
  Metric::AppDownloads,
  Metric::TotalMembers,
  Metric::ConvertedMembers,
  Metric::NewMembers,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
  pub metric: Metric,
  pub label: String,
  /// False when the sheet has none of the metric's columns (values are all 0).
  pub available: bool,
  pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
  pub range: TrendRange,
  pub weeks: Vec<String>,
  pub series: Vec<Series>,
  /// Index of the selected week inside the window, if it falls inside.
  pub selected_index: Option<usize>,
}

/// Project the last `range.weeks()` rows onto `metrics`.
pub fn trend(
  table: &NormalizedTable,
  registry: &ResolvedRegistry,
  range: TrendRange,
  metrics: &[Metric],
  selected_week: &str,
) -> Trend {
  let rows = trailing_rows(table, range.weeks());
  let weeks: Vec<String> = rows.iter().map(|r| r.week.clone()).collect();
  let selected_index = weeks.iter().position(|w| w == selected_week);

  let series = metrics
    .iter()
    .map(|&metric| Series {
      metric,
      label: metric.label().to_string(),
      available: registry.is_available(metric),
      values: rows.iter().map(|r| registry.value(r, metric)).collect(),
    })
    .collect();

  Trend {
    range,
    weeks,
    series,
    selected_index,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::normalize::normalize;
  use crate::types::{RawTable, RawValue};

  fn weeks(n: usize) -> NormalizedTable {
    let rows: Vec<Vec<RawValue>> = (1..=n)
      .map(|i| vec![RawValue::from(format!("W{}", i)), RawValue::Number(i as f64)])
      .collect();
    normalize(&RawTable::from_rows(&["주차", "뉴스_PV"], rows), &Config::default())
  }

  #[test]
  fn range_parses_aliases() {
    assert_eq!("year".parse::<TrendRange>().unwrap(), TrendRange::Year);
    assert_eq!("6m".parse::<TrendRange>().unwrap(), TrendRange::HalfYear);
    assert_eq!("Quarter".parse::<TrendRange>().unwrap(), TrendRange::Quarter);
    assert!("decade".parse::<TrendRange>().is_err());
  }

  #[test]
  fn quarter_window_takes_last_thirteen_weeks() {
    let t = weeks(20);
    let reg = ResolvedRegistry::resolve(&t);
    let tr = trend(&t, &reg, TrendRange::Quarter, &[Metric::NewsPv], "W20");
    assert_eq!(tr.weeks.len(), 13);
    assert_eq!(tr.weeks[0], "W8");
    assert_eq!(tr.series[0].values[12], 20.0);
    assert_eq!(tr.selected_index, Some(12));
  }

  #[test]
  fn selected_week_outside_window_has_no_index() {
    let t = weeks(20);
    let reg = ResolvedRegistry::resolve(&t);
    let tr = trend(&t, &reg, TrendRange::Quarter, &[Metric::NewsPv], "W2");
    assert_eq!(tr.selected_index, None);
  }

  #[test]
  fn short_table_yields_whole_table_and_flags_missing_metrics() {
    let t = weeks(5);
    let reg = ResolvedRegistry::resolve(&t);
    let tr = trend(&t, &reg, TrendRange::Year, &TREND_METRICS, "W3");
    assert_eq!(tr.weeks.len(), 5);
    assert!(tr.series[0].available);
    let downloads = tr
      .series
      .iter()
      .find(|s| s.metric == Metric::NewsAppDownloads)
      .unwrap();
    assert!(!downloads.available);
    assert!(downloads.values.iter().all(|v| *v == 0.0));
  }
}
