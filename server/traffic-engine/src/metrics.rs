//! Metric registry and accessor.
//!
//! Every tracked metric maps to candidate column names and an aggregation
//! rule. The registry is resolved once against a normalized table so the rest
//! of the engine never looks columns up by string.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Cell, MetricPair, NormalizedTable, WeekRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
  BroadcastPv,
  NewsPv,
  BroadcastUv,
  NewsUv,
  /// Broadcast app downloads, Android + iOS.
  AppDownloads,
  NewsAppDownloads,
  TotalMembers,
  ConvertedMembers,
  NewMembers,
  ChurnedMembers,
}

/// How a metric is read from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
  /// First candidate column present in the table.
  Single(&'static [&'static str]),
  /// Sum of two sides; an absent side contributes 0.
  Sum(&'static [&'static str], &'static [&'static str]),
}

impl Metric {
  pub const ALL: [Metric; 10] = [
    Metric::BroadcastPv,
    Metric::NewsPv,
    Metric::BroadcastUv,
    Metric::NewsUv,
    Metric::AppDownloads,
    Metric::NewsAppDownloads,
    Metric::TotalMembers,
    Metric::ConvertedMembers,
    Metric::NewMembers,
    Metric::ChurnedMembers,
  ];

  pub fn key(self) -> &'static str {
    match self {
      Self::BroadcastPv => "broadcast_pv",
      Self::NewsPv => "news_pv",
      Self::BroadcastUv => "broadcast_uv",
      Self::NewsUv => "news_uv",
      Self::AppDownloads => "app_downloads",
      Self::NewsAppDownloads => "news_app_downloads",
      Self::TotalMembers => "total_members",
      Self::ConvertedMembers => "converted_members",
      Self::NewMembers => "new_members",
      Self::ChurnedMembers => "churned_members",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::BroadcastPv => "Broadcast PV",
      Self::NewsPv => "News PV",
      Self::BroadcastUv => "Broadcast UV",
      Self::NewsUv => "News UV",
      Self::AppDownloads => "App downloads",
      Self::NewsAppDownloads => "News app downloads",
      Self::TotalMembers => "Total members",
      Self::ConvertedMembers => "Converted members",
      Self::NewMembers => "New members",
      Self::ChurnedMembers => "Churned members",
    }
  }

  pub fn rule(self) -> Rule {
    match self {
      Self::BroadcastPv => Rule::Single(&["방송_PV", "broadcast_pv"]),
      Self::NewsPv => Rule::Single(&["뉴스_PV", "news_pv"]),
      Self::BroadcastUv => Rule::Single(&["방송_사용자", "broadcast_uv"]),
      Self::NewsUv => Rule::Single(&["뉴스_사용자", "뉴스_UV", "뉴스UV", "뉴스_사용자수", "news_uv"]),
      Self::AppDownloads => Rule::Sum(
        &["방송_AOS 다운로드", "broadcast_aos_downloads"],
        &["방송_iOS 다운로드", "broadcast_ios_downloads"],
      ),
      Self::NewsAppDownloads => Rule::Sum(
        &["뉴스_AOS 다운로드", "news_aos_downloads"],
        &["뉴스_iOS 다운로드", "news_ios_downloads"],
      ),
      Self::TotalMembers => Rule::Single(&["총회원수", "total_members"]),
      Self::ConvertedMembers => Rule::Single(&["누적전환회원", "converted_members"]),
      Self::NewMembers => Rule::Single(&["신규회원", "new_members"]),
      Self::ChurnedMembers => Rule::Single(&["탈퇴회원", "churned_members"]),
    }
  }
}

/// Read `column` from `row` as a number; absent or non-numeric cells yield `default`.
pub fn get(row: &WeekRow, column: &str, default: f64) -> f64 {
  row.get(column).and_then(Cell::as_number).unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
  Single(Option<String>),
  Sum(Option<String>, Option<String>),
}

/// Registry bound to one table's columns.
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
  entries: HashMap<Metric, Resolved>,
}

impl ResolvedRegistry {
  pub fn resolve(table: &NormalizedTable) -> Self {
    let pick = |candidates: &[&str]| -> Option<String> {
      candidates
        .iter()
        .find(|c| table.has_column(c))
        .map(|c| c.to_string())
    };

    let entries = Metric::ALL
      .iter()
      .map(|&metric| {
        let resolved = match metric.rule() {
          Rule::Single(candidates) => Resolved::Single(pick(candidates)),
          Rule::Sum(a, b) => Resolved::Sum(pick(a), pick(b)),
        };
        (metric, resolved)
      })
      .collect();

    Self { entries }
  }

  /// Whether any source column of `metric` exists in the table.
  pub fn is_available(&self, metric: Metric) -> bool {
    match self.entries.get(&metric) {
      Some(Resolved::Single(col)) => col.is_some(),
      Some(Resolved::Sum(a, b)) => a.is_some() || b.is_some(),
      None => false,
    }
  }

  /// Value of `metric` in `row`; missing sources read as 0.
  pub fn value(&self, row: &WeekRow, metric: Metric) -> f64 {
    let side = |col: &Option<String>| col.as_deref().map(|c| get(row, c, 0.0)).unwrap_or(0.0);
    match self.entries.get(&metric) {
      Some(Resolved::Single(col)) => side(col),
      Some(Resolved::Sum(a, b)) => side(a) + side(b),
      None => 0.0,
    }
  }

  /// Current/previous pair. A single-column metric with no column has no previous value;
  /// a composite always has one when a previous row exists.
  pub fn pair(&self, current: &WeekRow, previous: Option<&WeekRow>, metric: Metric) -> MetricPair {
    let previous = match self.entries.get(&metric) {
      Some(Resolved::Single(None)) | None => None,
      Some(_) => previous.map(|p| self.value(p, metric)),
    };
    MetricPair {
      current: self.value(current, metric),
      previous,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::normalize::normalize;
  use crate::types::{RawTable, RawValue};

  fn table(columns: &[&str], rows: Vec<Vec<RawValue>>) -> NormalizedTable {
    normalize(&RawTable::from_rows(columns, rows), &Config::default())
  }

  #[test]
  fn absent_column_returns_default() {
    let t = table(&["주차"], vec![vec![RawValue::from("W1")]]);
    assert_eq!(get(&t.rows[0], "방송_PV", 0.0), 0.0);
    assert_eq!(get(&t.rows[0], "방송_PV", 7.0), 7.0);
  }

  #[test]
  fn composite_sums_both_sides() {
    let t = table(
      &["주차", "방송_AOS 다운로드", "방송_iOS 다운로드"],
      vec![vec![RawValue::from("W1"), RawValue::from("1,200"), RawValue::from("800")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    assert_eq!(reg.value(&t.rows[0], Metric::AppDownloads), 2000.0);
  }

  #[test]
  fn composite_with_one_side_missing_counts_zero() {
    let t = table(
      &["주차", "방송_iOS 다운로드"],
      vec![vec![RawValue::from("W1"), RawValue::from("800")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    assert_eq!(reg.value(&t.rows[0], Metric::AppDownloads), 800.0);
  }

  #[test]
  fn composite_with_both_sides_missing_is_zero_not_unavailable() {
    let t = table(
      &["주차"],
      vec![vec![RawValue::from("W1")], vec![RawValue::from("W2")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    let pair = reg.pair(&t.rows[1], Some(&t.rows[0]), Metric::AppDownloads);
    assert_eq!(pair.current, 0.0);
    assert_eq!(pair.previous, Some(0.0));
    assert!(!reg.is_available(Metric::AppDownloads));
  }

  #[test]
  fn first_present_candidate_wins() {
    let t = table(
      &["주차", "뉴스_UV", "뉴스_사용자수"],
      vec![vec![RawValue::from("W1"), RawValue::from("10"), RawValue::from("20")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    assert_eq!(reg.value(&t.rows[0], Metric::NewsUv), 10.0);
  }

  #[test]
  fn missing_single_metric_has_no_previous() {
    let t = table(
      &["주차"],
      vec![vec![RawValue::from("W1")], vec![RawValue::from("W2")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    let pair = reg.pair(&t.rows[1], Some(&t.rows[0]), Metric::NewsUv);
    assert_eq!(pair, MetricPair { current: 0.0, previous: None });
  }

  #[test]
  fn english_aliases_resolve() {
    let t = table(
      &["week", "broadcast_pv"],
      vec![vec![RawValue::from("W1"), RawValue::from("100")]],
    );
    let reg = ResolvedRegistry::resolve(&t);
    assert_eq!(reg.value(&t.rows[0], Metric::BroadcastPv), 100.0);
  }
}
