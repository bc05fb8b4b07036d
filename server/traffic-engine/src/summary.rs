//! Evidence summary and KPI panel assembly.

use crate::delta::{abs_delta, format_count, percent_delta};
use crate::metrics::{Metric, ResolvedRegistry};
use crate::types::*;

/// Metrics carried in KPI deltas and in every trailing snapshot.
pub const EVIDENCE_METRICS: [Metric; 8] = [
  Metric::BroadcastPv,
  Metric::NewsPv,
  Metric::BroadcastUv,
  Metric::AppDownloads,
  Metric::TotalMembers,
  Metric::ConvertedMembers,
  Metric::NewMembers,
  Metric::ChurnedMembers,
];

/// Build the evidence summary for the resolved week.
///
/// The trailing window is the last `window` rows of the table (fewer if the
/// table is shorter), oldest first, independent of the selected week.
pub fn build(
  table: &NormalizedTable,
  registry: &ResolvedRegistry,
  current: &WeekRow,
  previous: Option<&WeekRow>,
  alerts: Vec<Alert>,
  window: usize,
) -> EvidenceSummary {
  let kpis: Vec<KpiDelta> = EVIDENCE_METRICS
    .iter()
    .map(|&metric| kpi_delta(registry, metric, current, previous))
    .collect();

  let trailing: Vec<WeekSnapshot> = trailing_rows(table, window)
    .iter()
    .map(|row| snapshot(registry, row))
    .collect();

  let report_id = report_id(&current.week, &kpis, &alerts, &trailing);

  EvidenceSummary {
    report_id,
    week: current.week.clone(),
    has_previous: previous.is_some(),
    kpis,
    alerts,
    window,
    trailing,
  }
}

/// Last `window` rows in chronological order.
pub fn trailing_rows(table: &NormalizedTable, window: usize) -> &[WeekRow] {
  let start = table.len().saturating_sub(window);
  &table.rows[start..]
}

fn kpi_delta(
  registry: &ResolvedRegistry,
  metric: Metric,
  current: &WeekRow,
  previous: Option<&WeekRow>,
) -> KpiDelta {
  let pair = registry.pair(current, previous, metric);
  KpiDelta {
    metric,
    label: metric.label().to_string(),
    current: pair.current,
    previous: pair.previous,
    percent_delta: percent_delta(pair.current, pair.previous),
    abs_delta: abs_delta(pair.current, pair.previous),
  }
}

fn snapshot(registry: &ResolvedRegistry, row: &WeekRow) -> WeekSnapshot {
  let v = |metric| truncate(registry.value(row, metric));
  WeekSnapshot {
    week: row.week.clone(),
    broadcast_pv: v(Metric::BroadcastPv),
    news_pv: v(Metric::NewsPv),
    broadcast_uv: v(Metric::BroadcastUv),
    app_downloads: v(Metric::AppDownloads),
    total_members: v(Metric::TotalMembers),
    converted_members: v(Metric::ConvertedMembers),
    new_members: v(Metric::NewMembers),
    churned_members: v(Metric::ChurnedMembers),
  }
}

/// Integer cast toward zero; non-finite reads as 0.
fn truncate(value: f64) -> i64 {
  if value.is_finite() {
    value as i64
  } else {
    0
  }
}

/// Stable id: blake3 over the week label and every value in the payload.
fn report_id(week: &str, kpis: &[KpiDelta], alerts: &[Alert], trailing: &[WeekSnapshot]) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(week.as_bytes());
  for k in kpis {
    hasher.update(b"|");
    hasher.update(k.metric.key().as_bytes());
    hasher.update(format!(":{}:{:?}", k.current, k.previous).as_bytes());
  }
  for a in alerts {
    hasher.update(b"|!");
    hasher.update(a.metric.key().as_bytes());
  }
  for s in trailing {
    hasher.update(b"|");
    hasher.update(
      format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}",
        s.week,
        s.broadcast_pv,
        s.news_pv,
        s.broadcast_uv,
        s.app_downloads,
        s.total_members,
        s.converted_members,
        s.new_members,
        s.churned_members
      )
      .as_bytes(),
    );
  }
  let hex = hasher.finalize().to_hex();
  format!("rpt-{}", &hex[..16])
}

/// KPI panels: news, broadcast, members.
pub fn panels(
  registry: &ResolvedRegistry,
  current: &WeekRow,
  previous: Option<&WeekRow>,
) -> Vec<KpiPanel> {
  let layout: [(&str, &[(Metric, &str)]); 3] = [
    (
      "News",
      &[
        (Metric::NewsPv, "News PV"),
        (Metric::NewsUv, "News UV"),
        (Metric::AppDownloads, "App downloads"),
      ],
    ),
    (
      "Broadcast",
      &[
        (Metric::BroadcastPv, "Broadcast PV"),
        (Metric::BroadcastUv, "Broadcast UV"),
        (Metric::AppDownloads, "Broadcast app downloads"),
      ],
    ),
    (
      "Members",
      &[
        (Metric::TotalMembers, "Total members"),
        (Metric::ConvertedMembers, "Converted members"),
        (Metric::NewMembers, "New members"),
        (Metric::ChurnedMembers, "Churned members"),
      ],
    ),
  ];

  layout
    .iter()
    .map(|(title, entries)| KpiPanel {
      title: title.to_string(),
      entries: entries
        .iter()
        .map(|&(metric, label)| {
          let pair = registry.pair(current, previous, metric);
          KpiEntry {
            metric,
            label: label.to_string(),
            value: format_count(pair.current),
            delta: percent_delta(pair.current, pair.previous),
          }
        })
        .collect(),
    })
    .collect()
}
