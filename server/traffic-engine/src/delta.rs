//! Week-over-week deltas and number formatting.

use crate::types::Cell;

/// Marker for an undefined delta (no baseline, zero baseline, or non-numeric input).
pub const NOT_AVAILABLE: &str = "N/A";

/// Fractional change (curr - prev) / prev. `None` without a usable, non-zero baseline.
pub fn fractional_change(curr: f64, prev: Option<f64>) -> Option<f64> {
  let prev = prev.filter(|p| p.is_finite() && *p != 0.0)?;
  if !curr.is_finite() {
    return None;
  }
  Some((curr - prev) / prev)
}

/// Percent change with forced sign and one decimal, e.g. `+20.0%`.
pub fn percent_delta(curr: f64, prev: Option<f64>) -> String {
  match fractional_change(curr, prev) {
    Some(change) => format!("{:+.1}%", change * 100.0),
    None => NOT_AVAILABLE.to_string(),
  }
}

/// Absolute change with forced sign and thousands separators, e.g. `+1,234`.
///
/// A zero baseline is fine here; only a missing or non-numeric operand is `N/A`.
pub fn abs_delta(curr: f64, prev: Option<f64>) -> String {
  match prev {
    Some(p) if p.is_finite() && curr.is_finite() => format_signed_count(curr - p),
    _ => NOT_AVAILABLE.to_string(),
  }
}

/// `percent_delta` over raw cells; a cell that does not read as a number yields `N/A`.
pub fn percent_delta_cells(curr: &Cell, prev: Option<&Cell>) -> String {
  match (curr.as_number(), prev.map(Cell::as_number)) {
    (Some(c), Some(Some(p))) => percent_delta(c, Some(p)),
    _ => NOT_AVAILABLE.to_string(),
  }
}

/// `abs_delta` over raw cells.
pub fn abs_delta_cells(curr: &Cell, prev: Option<&Cell>) -> String {
  match (curr.as_number(), prev.map(Cell::as_number)) {
    (Some(c), Some(Some(p))) => abs_delta(c, Some(p)),
    _ => NOT_AVAILABLE.to_string(),
  }
}

/// Rounded to a whole number with thousands separators: `1234567.4` -> `1,234,567`.
pub fn format_count(value: f64) -> String {
  if !value.is_finite() {
    return value.to_string();
  }
  let rounded = format!("{:.0}", value);
  let (sign, digits) = match rounded.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", rounded.as_str()),
  };
  format!("{}{}", sign, group_thousands(digits))
}

/// `format_count` with an explicit `+` on non-negative values.
pub fn format_signed_count(value: f64) -> String {
  let s = format_count(value);
  if s.starts_with('-') {
    s
  } else {
    format!("+{}", s)
  }
}

fn group_thousands(digits: &str) -> String {
  let len = digits.len();
  let mut out = String::with_capacity(len + len / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
