//! Threshold-based surge/drop detection, one threshold per tracked metric.

use std::fmt;

use tracing::debug;

use crate::config::SurgeRule;
use crate::delta::{format_count, fractional_change};
use crate::metrics::{Metric, ResolvedRegistry};
use crate::types::{Alert, AlertStatus, Direction, WeekRow};

/// Emit an alert iff |(curr - prev) / prev| >= threshold (boundary inclusive).
///
/// Skips silently when there is no previous value or it is zero.
pub fn detect(metric: Metric, curr: f64, prev: Option<f64>, threshold: f64) -> Option<Alert> {
  let change = fractional_change(curr, prev)?;
  if change.abs() < threshold {
    return None;
  }
  let direction = if change > 0.0 {
    Direction::Surge
  } else {
    Direction::Drop
  };
  Some(Alert {
    metric,
    label: metric.label().to_string(),
    previous: prev.unwrap_or_default(),
    current: curr,
    change_pct: change * 100.0,
    threshold,
    direction,
  })
}

/// Run every rule against the current/previous rows, in rule order.
pub fn detect_all(
  registry: &ResolvedRegistry,
  current: &WeekRow,
  previous: Option<&WeekRow>,
  rules: &[SurgeRule],
) -> Vec<Alert> {
  let alerts: Vec<Alert> = rules
    .iter()
    .filter_map(|rule| {
      let pair = registry.pair(current, previous, rule.metric);
      detect(rule.metric, pair.current, pair.previous, rule.threshold)
    })
    .collect();
  debug!(week = %current.week, alerts = alerts.len(), "surge check");
  alerts
}

/// Overall status for the resolved week.
pub fn status(previous: Option<&WeekRow>, alerts: &[Alert]) -> AlertStatus {
  if previous.is_none() {
    AlertStatus::NoBaseline
  } else if alerts.is_empty() {
    AlertStatus::Stable
  } else {
    AlertStatus::Alerts
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Surge => write!(f, "surge"),
      Self::Drop => write!(f, "drop"),
    }
  }
}

impl fmt::Display for Alert {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "- **{}**: {:.1}% {} week over week ({} → {})",
      self.label,
      self.change_pct,
      self.direction,
      format_count(self.previous),
      format_count(self.current)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::normalize::normalize;
  use crate::types::{RawTable, RawValue};

  #[test]
  fn twenty_percent_rise_over_ten_percent_threshold_alerts() {
    let alert = detect(Metric::BroadcastPv, 120.0, Some(100.0), 0.10).unwrap();
    assert_eq!(alert.direction, Direction::Surge);
    assert!((alert.change_pct - 20.0).abs() < 1e-9);
    assert_eq!(alert.previous, 100.0);
    assert_eq!(alert.current, 120.0);
  }

  #[test]
  fn threshold_boundary_is_inclusive() {
    assert!(detect(Metric::NewsPv, 110.0, Some(100.0), 0.10).is_some());
    assert!(detect(Metric::NewsPv, 109.0, Some(100.0), 0.10).is_none());
  }

  #[test]
  fn drop_direction_from_negative_change() {
    let alert = detect(Metric::NewMembers, 70.0, Some(100.0), 0.20).unwrap();
    assert_eq!(alert.direction, Direction::Drop);
    assert!(alert.change_pct < 0.0);
  }

  #[test]
  fn zero_or_missing_baseline_never_alerts() {
    assert!(detect(Metric::BroadcastPv, 50.0, Some(0.0), 0.10).is_none());
    assert!(detect(Metric::BroadcastPv, 50.0, None, 0.10).is_none());
  }

  #[test]
  fn alert_renders_percent_direction_and_values() {
    let alert = detect(Metric::BroadcastPv, 1500.0, Some(1000.0), 0.10).unwrap();
    assert_eq!(
      alert.to_string(),
      "- **Broadcast PV**: 50.0% surge week over week (1,000 → 1,500)"
    );
  }

  #[test]
  fn detect_all_uses_each_metric_threshold() {
    let raw = RawTable::from_rows(
      &["주차", "방송_PV", "누적전환회원", "신규회원"],
      vec![
        vec![
          RawValue::from("W1"),
          RawValue::from("100"),
          RawValue::from("1000"),
          RawValue::from("100"),
        ],
        vec![
          RawValue::from("W2"),
          RawValue::from("105"),
          RawValue::from("1060"),
          RawValue::from("115"),
        ],
      ],
    );
    let table = normalize(&raw, &Config::default());
    let reg = ResolvedRegistry::resolve(&table);
    let alerts = detect_all(
      &reg,
      &table.rows[1],
      Some(&table.rows[0]),
      &Config::default().surge_rules,
    );
    // +5% PV (under 10%), +15% new members (under 20%), +6% converted (over 5%).
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].metric, Metric::ConvertedMembers);
  }

  #[test]
  fn status_reflects_baseline_and_alerts() {
    let raw = RawTable::from_rows(
      &["주차"],
      vec![vec![RawValue::from("W1")], vec![RawValue::from("W2")]],
    );
    let table = normalize(&raw, &Config::default());
    assert_eq!(status(None, &[]), AlertStatus::NoBaseline);
    assert_eq!(status(Some(&table.rows[0]), &[]), AlertStatus::Stable);
    let alert = detect(Metric::NewsPv, 2.0, Some(1.0), 0.1).unwrap();
    assert_eq!(status(Some(&table.rows[0]), &[alert]), AlertStatus::Alerts);
  }
}
