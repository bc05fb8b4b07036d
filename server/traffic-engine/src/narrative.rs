//! Narrative generation port: evidence text, the fixed instruction template,
//! and the two-state cache of the generated report.

use crate::error::NarrativeError;
use crate::types::EvidenceSummary;

/// An external text generator. Called once per (re)generation, blocking.
pub trait NarrativePort {
  fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

/// Everything the generator sees: a pure function of the summary and the template.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
  pub report_id: String,
  pub evidence: String,
  pub prompt: String,
}

impl NarrativeRequest {
  pub fn from_summary(summary: &EvidenceSummary, language: &str) -> Result<Self, NarrativeError> {
    let evidence = render_evidence(summary)?;
    let prompt = instruction_template(&summary.week, summary.window, language, &evidence);
    Ok(Self {
      report_id: summary.report_id.clone(),
      evidence,
      prompt,
    })
  }
}

/// Render the summary as the evidence block handed to the generator.
pub fn render_evidence(summary: &EvidenceSummary) -> Result<String, NarrativeError> {
  let kpi_lines: Vec<String> = summary
    .kpis
    .iter()
    .map(|k| {
      format!(
        "- {}: {} (WoW {} / {})",
        k.label,
        crate::delta::format_count(k.current),
        k.percent_delta,
        k.abs_delta
      )
    })
    .collect();

  let quick_check = if summary.alerts.is_empty() {
    "- no notable changes".to_string()
  } else {
    summary
      .alerts
      .iter()
      .map(|a| a.to_string())
      .collect::<Vec<_>>()
      .join("\n")
  };

  let trailing = serde_json::to_string(&summary.trailing)?;

  Ok(format!(
    "[Base week]: {week}\n\
     [This week KPIs and week-over-week change]\n{kpis}\n\
     [Rule-based quick check]\n{quick_check}\n\
     [Last {window} weeks (evidence)]\n{trailing}",
    week = summary.week,
    kpis = kpi_lines.join("\n"),
    quick_check = quick_check,
    window = summary.window,
    trailing = trailing,
  ))
}

/// Fixed instructions: output format, tone, and evidence constraints.
pub fn instruction_template(week: &str, window: usize, language: &str, evidence: &str) -> String {
  format!(
    r#"You are the lead data analyst writing the weekly traffic report for executives.
Follow every rule below.

[Rules]
- Use only the input data (this week, previous week, last {window} weeks, quick check) as evidence.
- Do not assert anything absent from the input; mark it "uncertain" or "(speculation)".
- Cite numbers wherever possible: week-over-week %, absolute change, notable points in the last {window} weeks.
- No period at the end of sentences.
- Write in {language}, in a concise report register.
- No exaggeration; favour actionable suggestions.

[Input data]
{evidence}

[Output format (mandatory)]
Weekly Traffic Analysis Report ({week})
1. Three-line summary
- (three lines, each with a supporting number)
2. Metrics to watch (top 2)
- Metric 1: (this week / WoW % / absolute change) + two lines of interpretation
- Metric 2: (this week / WoW % / absolute change) + two lines of interpretation
3. Hypotheses and suggestions
- Hypothesis 1: ...
  - Evidence (from the input data): ...
  - Data or questions to confirm: ...
  - Suggestion (immediate action): ...
- Hypothesis 2: ...
  - Evidence (from the input data): ...
  - Data or questions to confirm: ...
  - Suggestion (immediate action): ...
- Hypothesis 3: ...
  - Evidence (from the input data): ...
  - Data or questions to confirm: ...
  - Suggestion (immediate action): ...
4. Next-action checklist
- (3 to 6 items an owner can act on right away)"#,
    window = window,
    language = language,
    evidence = evidence,
    week = week,
  )
}

/// The generated report, held until explicitly regenerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NarrativeState {
  #[default]
  Pending,
  Generated { report_id: String, text: String },
}

impl NarrativeState {
  /// Generate once; later calls return the cached text until `regenerate`.
  pub fn get_or_generate(
    &mut self,
    summary: &EvidenceSummary,
    port: &dyn NarrativePort,
    language: &str,
  ) -> Result<&str, NarrativeError> {
    if let Self::Pending = self {
      let request = NarrativeRequest::from_summary(summary, language)?;
      let text = port.generate(&request)?;
      *self = Self::Generated {
        report_id: request.report_id,
        text,
      };
    }
    match self {
      Self::Generated { text, .. } => Ok(text.as_str()),
      Self::Pending => Err(NarrativeError::Unavailable("report not generated".into())),
    }
  }

  /// Drop the cached report so the next request generates a new one.
  pub fn regenerate(&mut self) {
    *self = Self::Pending;
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      Self::Generated { text, .. } => Some(text.as_str()),
      Self::Pending => None,
    }
  }

  /// Whether the cached report was generated from this exact summary.
  pub fn is_for(&self, summary: &EvidenceSummary) -> bool {
    matches!(self, Self::Generated { report_id, .. } if *report_id == summary.report_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metrics::Metric;
  use crate::surge;
  use crate::types::{KpiDelta, WeekSnapshot};
  use std::cell::Cell;

  fn summary() -> EvidenceSummary {
    EvidenceSummary {
      report_id: "rpt-0123456789abcdef".into(),
      week: "W2".into(),
      has_previous: true,
      kpis: vec![KpiDelta {
        metric: Metric::BroadcastPv,
        label: "Broadcast PV".into(),
        current: 1200.0,
        previous: Some(1000.0),
        percent_delta: "+20.0%".into(),
        abs_delta: "+200".into(),
      }],
      alerts: surge::detect(Metric::BroadcastPv, 1200.0, Some(1000.0), 0.1)
        .into_iter()
        .collect(),
      window: 8,
      trailing: vec![WeekSnapshot {
        week: "W2".into(),
        broadcast_pv: 1200,
        news_pv: 0,
        broadcast_uv: 0,
        app_downloads: 0,
        total_members: 0,
        converted_members: 0,
        new_members: 0,
        churned_members: 0,
      }],
    }
  }

  struct Echo {
    calls: Cell<usize>,
  }

  impl NarrativePort for Echo {
    fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
      self.calls.set(self.calls.get() + 1);
      Ok(format!("report {} #{}", request.report_id, self.calls.get()))
    }
  }

  struct Down;

  impl NarrativePort for Down {
    fn generate(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
      Err(NarrativeError::MissingApiKey("GEMINI_API_KEY".into()))
    }
  }

  #[test]
  fn evidence_lists_kpis_alerts_and_trailing_weeks() {
    let text = render_evidence(&summary()).unwrap();
    assert!(text.contains("[Base week]: W2"));
    assert!(text.contains("- Broadcast PV: 1,200 (WoW +20.0% / +200)"));
    assert!(text.contains("- **Broadcast PV**: 20.0% surge"));
    assert!(text.contains("[Last 8 weeks (evidence)]"));
    assert!(text.contains("\"broadcast_pv\":1200"));
  }

  #[test]
  fn evidence_without_alerts_says_so() {
    let mut s = summary();
    s.alerts.clear();
    assert!(render_evidence(&s).unwrap().contains("- no notable changes"));
  }

  #[test]
  fn prompt_embeds_evidence_and_constraints() {
    let req = NarrativeRequest::from_summary(&summary(), "Korean").unwrap();
    assert!(req.prompt.contains(&req.evidence));
    assert!(req.prompt.contains("Write in Korean"));
    assert!(req.prompt.contains("Weekly Traffic Analysis Report (W2)"));
    assert!(req.prompt.contains("(speculation)"));
  }

  #[test]
  fn request_is_a_pure_function_of_the_summary() {
    let a = NarrativeRequest::from_summary(&summary(), "Korean").unwrap();
    let b = NarrativeRequest::from_summary(&summary(), "Korean").unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn generated_report_is_cached_until_regenerated() {
    let port = Echo { calls: Cell::new(0) };
    let s = summary();
    let mut state = NarrativeState::default();

    assert_eq!(state.get_or_generate(&s, &port, "Korean").unwrap(), "report rpt-0123456789abcdef #1");
    assert_eq!(state.get_or_generate(&s, &port, "Korean").unwrap(), "report rpt-0123456789abcdef #1");
    assert_eq!(port.calls.get(), 1);
    assert!(state.is_for(&s));

    state.regenerate();
    assert!(state.text().is_none());
    assert_eq!(state.get_or_generate(&s, &port, "Korean").unwrap(), "report rpt-0123456789abcdef #2");
  }

  #[test]
  fn failure_leaves_state_pending() {
    let mut state = NarrativeState::default();
    let err = state.get_or_generate(&summary(), &Down, "Korean").unwrap_err();
    assert!(err.to_string().contains("GEMINI_API_KEY"));
    assert_eq!(state, NarrativeState::Pending);
  }
}
