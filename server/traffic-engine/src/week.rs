//! Week selection: resolve a week label to its row and the row before it.
//!
//! "Previous week" is always the preceding row in table order, never a date
//! lookup. Out-of-order or duplicate labels do not change that.

use tracing::info;

use crate::types::{NormalizedTable, WeekRow};

/// The resolved current row and its predecessor.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
  pub current: &'a WeekRow,
  pub previous: Option<&'a WeekRow>,
  /// False when the selection was missing and the latest week was used instead.
  pub matched: bool,
}

/// Resolve `selected` by exact, case-sensitive match on the week label.
///
/// The first matching row wins. Without a match, falls back to the last row
/// and its predecessor. Returns `None` only for an empty table.
pub fn resolve<'a>(table: &'a NormalizedTable, selected: Option<&str>) -> Option<Resolution<'a>> {
  let found = selected.and_then(|s| table.rows.iter().find(|r| r.week == s));

  let (current, matched) = match found {
    Some(row) => (row, true),
    None => {
      if let Some(s) = selected {
        info!(selected = s, "week not found; using latest week");
      }
      (table.rows.last()?, false)
    }
  };

  Some(Resolution {
    current,
    previous: previous_of(table, current.position),
    matched,
  })
}

/// Row at `position - 1`, or `None` at position 0 or out of bounds.
pub fn previous_of(table: &NormalizedTable, position: usize) -> Option<&WeekRow> {
  position.checked_sub(1).and_then(|p| table.row(p))
}

/// Week labels for selection, most recent first. The first entry is the default.
pub fn week_options(table: &NormalizedTable) -> Vec<String> {
  table.rows.iter().rev().map(|r| r.week.clone()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::normalize::normalize;
  use crate::types::{RawTable, RawValue};

  fn table(weeks: &[&str]) -> NormalizedTable {
    let rows: Vec<Vec<RawValue>> = weeks
      .iter()
      .enumerate()
      .map(|(i, w)| vec![RawValue::from(*w), RawValue::Number(i as f64)])
      .collect();
    normalize(&RawTable::from_rows(&["주차", "방송_PV"], rows), &Config::default())
  }

  #[test]
  fn previous_is_none_only_at_position_zero() {
    let t = table(&["W1", "W2", "W3"]);
    for row in &t.rows {
      let r = resolve(&t, Some(&row.week)).unwrap();
      assert_eq!(r.previous.is_none(), row.position == 0);
    }
  }

  #[test]
  fn selected_week_resolves_to_row_and_predecessor() {
    let t = table(&["W1", "W2", "W3"]);
    let r = resolve(&t, Some("W2")).unwrap();
    assert!(r.matched);
    assert_eq!(r.current.week, "W2");
    assert_eq!(r.previous.unwrap().week, "W1");
  }

  #[test]
  fn missing_week_falls_back_to_last_two_rows() {
    let t = table(&["W1", "W2", "W3"]);
    let fallback = resolve(&t, Some("W9")).unwrap();
    let explicit = resolve(&t, Some("W3")).unwrap();
    assert!(!fallback.matched);
    assert_eq!(fallback.current, explicit.current);
    assert_eq!(fallback.previous, explicit.previous);
  }

  #[test]
  fn match_is_case_sensitive() {
    let t = table(&["w1", "W2"]);
    let r = resolve(&t, Some("W1")).unwrap();
    assert!(!r.matched);
    assert_eq!(r.current.week, "W2");
  }

  #[test]
  fn out_of_order_labels_use_table_order() {
    let t = table(&["W3", "W1", "W2"]);
    let r = resolve(&t, Some("W1")).unwrap();
    assert_eq!(r.previous.unwrap().week, "W3");
  }

  #[test]
  fn duplicate_labels_resolve_to_first_match() {
    let t = table(&["W1", "W2", "W2"]);
    let r = resolve(&t, Some("W2")).unwrap();
    assert_eq!(r.current.position, 1);
  }

  #[test]
  fn single_row_has_no_previous() {
    let t = table(&["W1"]);
    let r = resolve(&t, None).unwrap();
    assert_eq!(r.current.week, "W1");
    assert!(r.previous.is_none());
  }

  #[test]
  fn empty_table_resolves_to_none() {
    assert!(resolve(&NormalizedTable::default(), Some("W1")).is_none());
  }

  #[test]
  fn options_are_most_recent_first() {
    let t = table(&["W1", "W2", "W3"]);
    assert_eq!(week_options(&t), vec!["W3", "W2", "W1"]);
  }
}
