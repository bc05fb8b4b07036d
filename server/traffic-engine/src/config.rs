//! Engine configuration with sane defaults.

use chrono::Duration;

use crate::metrics::Metric;

/// Surge/drop threshold for one tracked metric, as a fraction (0.10 = 10%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurgeRule {
  pub metric: Metric,
  pub threshold: f64,
}

impl SurgeRule {
  pub const fn new(metric: Metric, threshold: f64) -> Self {
    Self { metric, threshold }
  }
}

/// Tunable column rules and thresholds.
#[derive(Debug, Clone)]
pub struct Config {
  /// Week/date identifier columns, kept as text. The first one present is the week key.
  pub week_columns: Vec<String>,
  /// A rank column name ends with one of these...
  pub rank_suffixes: Vec<String>,
  /// ...and contains one of these (keyword/article ranks hold literal names).
  pub rank_markers: Vec<String>,
  /// Tracked metrics with their own thresholds, in alert order.
  pub surge_rules: Vec<SurgeRule>,
  /// Trailing weeks carried in the evidence summary.
  pub evidence_window: usize,
  /// How long a fetched table is reused for the same location.
  pub cache_ttl: Duration,
  /// Rows required before deltas make sense.
  pub min_rows: usize,
  /// Language the narrative generator is asked to write in.
  pub report_language: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      week_columns: strings(&["주차", "날짜", "Date", "week"]),
      rank_suffixes: strings(&["순위", "rank"]),
      rank_markers: strings(&["키워드", "기사", "keyword", "article"]),
      surge_rules: vec![
        SurgeRule::new(Metric::BroadcastPv, 0.10),
        SurgeRule::new(Metric::NewsPv, 0.10),
        SurgeRule::new(Metric::AppDownloads, 0.15),
        SurgeRule::new(Metric::NewMembers, 0.20),
        SurgeRule::new(Metric::ChurnedMembers, 0.20),
        SurgeRule::new(Metric::ConvertedMembers, 0.05),
      ],
      evidence_window: 8,
      cache_ttl: Duration::minutes(5),
      min_rows: 2,
      report_language: "Korean".to_string(),
    }
  }
}

impl Config {
  /// Threshold configured for `metric`, if it is tracked.
  pub fn threshold_for(&self, metric: Metric) -> Option<f64> {
    self
      .surge_rules
      .iter()
      .find(|r| r.metric == metric)
      .map(|r| r.threshold)
  }
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}
