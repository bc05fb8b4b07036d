//! Per-week breakdowns: news acquisition channels and keyword top-3.

use serde::Serialize;

use crate::metrics::get;
use crate::types::{Cell, NormalizedTable, WeekRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionSource {
  Direct,
  Naver,
  Daum,
  Google,
  Other,
}

impl AcquisitionSource {
  pub const ALL: [AcquisitionSource; 5] = [
    AcquisitionSource::Direct,
    AcquisitionSource::Naver,
    AcquisitionSource::Daum,
    AcquisitionSource::Google,
    AcquisitionSource::Other,
  ];

  /// Token used in the sheet's column names.
  fn column_token(self) -> &'static str {
    match self {
      Self::Direct => "다이렉트",
      Self::Naver => "네이버",
      Self::Daum => "다음",
      Self::Google => "구글",
      Self::Other => "기타",
    }
  }

  pub fn users_column(self) -> String {
    format!("뉴스_유입_{}_사용자", self.column_token())
  }

  pub fn sessions_column(self) -> String {
    format!("뉴스_유입_{}_세션", self.column_token())
  }
}

const TOTAL_USERS_COLUMN: &str = "뉴스_유입_전체_사용자";
const TOTAL_SESSIONS_COLUMN: &str = "뉴스_유입_전체_세션";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelShare {
  pub source: AcquisitionSource,
  pub users: f64,
  pub sessions: f64,
  /// Share of channel users in percent, one decimal.
  pub user_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionBreakdown {
  pub channels: Vec<ChannelShare>,
  pub total_users: f64,
  pub total_sessions: f64,
  /// False when every channel has zero sessions (no session split to show).
  pub sessions_available: bool,
}

/// Channel split for one week. Totals come from the sheet's total columns when
/// present, otherwise from the channel sum.
pub fn acquisition(table: &NormalizedTable, row: &WeekRow) -> AcquisitionBreakdown {
  let raw: Vec<(AcquisitionSource, f64, f64)> = AcquisitionSource::ALL
    .iter()
    .map(|&s| {
      (
        s,
        get(row, &s.users_column(), 0.0),
        get(row, &s.sessions_column(), 0.0),
      )
    })
    .collect();

  let users_sum: f64 = raw.iter().map(|(_, u, _)| u).sum();
  let sessions_sum: f64 = raw.iter().map(|(_, _, s)| s).sum();

  let channels = raw
    .into_iter()
    .map(|(source, users, sessions)| ChannelShare {
      source,
      users,
      sessions,
      user_share_pct: if users_sum > 0.0 {
        round1(users / users_sum * 100.0)
      } else {
        0.0
      },
    })
    .collect();

  let total = |column: &str, fallback: f64| {
    if table.has_column(column) {
      get(row, column, 0.0)
    } else {
      fallback
    }
  };

  AcquisitionBreakdown {
    channels,
    total_users: total(TOTAL_USERS_COLUMN, users_sum),
    total_sessions: total(TOTAL_SESSIONS_COLUMN, sessions_sum),
    sessions_available: sessions_sum != 0.0,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordEntry {
  pub rank: usize,
  pub keyword: String,
  pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeywordTop {
  /// Some rank/share columns are absent from the sheet.
  MissingColumns { columns: Vec<String> },
  /// Ranked keywords; blank ranks are skipped, so this may be empty.
  Ranked { entries: Vec<KeywordEntry> },
}

fn keyword_column(rank: usize) -> String {
  format!("뉴스_키워드{}순위", rank)
}

fn share_column(rank: usize) -> String {
  format!("뉴스_키워드{}비중", rank)
}

/// Top-3 news keywords with their share for one week.
pub fn keyword_top3(table: &NormalizedTable, row: &WeekRow) -> KeywordTop {
  let expected: Vec<String> = (1..=3)
    .map(keyword_column)
    .chain((1..=3).map(share_column))
    .collect();
  let missing: Vec<String> = expected
    .into_iter()
    .filter(|c| !table.has_column(c))
    .collect();
  if !missing.is_empty() {
    return KeywordTop::MissingColumns { columns: missing };
  }

  let entries = (1..=3)
    .filter_map(|rank| {
      let keyword = row
        .get(&keyword_column(rank))
        .map(Cell::as_text)
        .unwrap_or_default();
      let keyword = keyword.trim();
      if keyword.is_empty() || keyword.eq_ignore_ascii_case("nan") {
        return None;
      }
      Some(KeywordEntry {
        rank,
        keyword: keyword.to_string(),
        share_pct: get(row, &share_column(rank), 0.0),
      })
    })
    .collect();

  KeywordTop::Ranked { entries }
}

fn round1(v: f64) -> f64 {
  (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::normalize::normalize;
  use crate::types::{RawTable, RawValue};

  fn one_row(columns: &[&str], values: &[&str]) -> NormalizedTable {
    let row: Vec<RawValue> = values.iter().map(|v| RawValue::from_field(v)).collect();
    normalize(&RawTable::from_rows(columns, vec![row]), &Config::default())
  }

  #[test]
  fn shares_are_rounded_percent_of_channel_users() {
    let t = one_row(
      &["주차", "뉴스_유입_다이렉트_사용자", "뉴스_유입_네이버_사용자", "뉴스_유입_구글_세션"],
      &["W1", "1", "2", "40"],
    );
    let b = acquisition(&t, &t.rows[0]);
    assert_eq!(b.channels.len(), 5);
    assert_eq!(b.channels[0].user_share_pct, 33.3);
    assert_eq!(b.channels[1].user_share_pct, 66.7);
    assert_eq!(b.total_users, 3.0);
    assert_eq!(b.total_sessions, 40.0);
    assert!(b.sessions_available);
  }

  #[test]
  fn explicit_total_columns_win_over_sum() {
    let t = one_row(
      &["주차", "뉴스_유입_다이렉트_사용자", "뉴스_유입_전체_사용자"],
      &["W1", "10", "1,500"],
    );
    let b = acquisition(&t, &t.rows[0]);
    assert_eq!(b.total_users, 1500.0);
    assert!(!b.sessions_available);
  }

  #[test]
  fn zero_users_gives_zero_shares() {
    let t = one_row(&["주차"], &["W1"]);
    let b = acquisition(&t, &t.rows[0]);
    assert!(b.channels.iter().all(|c| c.user_share_pct == 0.0));
  }

  const KW: [&str; 7] = [
    "주차",
    "뉴스_키워드1순위",
    "뉴스_키워드2순위",
    "뉴스_키워드3순위",
    "뉴스_키워드1비중",
    "뉴스_키워드2비중",
    "뉴스_키워드3비중",
  ];

  #[test]
  fn keywords_keep_text_and_parse_shares() {
    let t = one_row(&KW, &["W1", "선거", "", "날씨", "12.5%", "9", "3,0"]);
    match keyword_top3(&t, &t.rows[0]) {
      KeywordTop::Ranked { entries } => {
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].keyword, "선거");
        assert_eq!(entries[0].share_pct, 12.5);
        assert_eq!(entries[1].rank, 3);
        assert_eq!(entries[1].share_pct, 30.0);
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn missing_keyword_columns_are_named() {
    let t = one_row(&KW[..4], &["W1", "a", "b", "c"]);
    match keyword_top3(&t, &t.rows[0]) {
      KeywordTop::MissingColumns { columns } => {
        assert_eq!(columns, vec!["뉴스_키워드1비중", "뉴스_키워드2비중", "뉴스_키워드3비중"]);
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn nan_keyword_is_skipped() {
    let t = one_row(&KW, &["W1", "nan", "NaN", "x", "1", "2", "3"]);
    match keyword_top3(&t, &t.rows[0]) {
      KeywordTop::Ranked { entries } => assert_eq!(entries.len(), 1),
      other => panic!("unexpected {:?}", other),
    }
  }
}
