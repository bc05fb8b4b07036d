//! Binary entrypoint: load a weekly traffic sheet, write the report as JSON lines.
//!
//! Output lines (stdout):
//! - `{"weeks": [...]}` with `--list-weeks`, most recent first
//! - the WeeklyReport for the selected week
//! - a Trend, with `--range`
//! - `{"report_id", "narrative"}` with `--narrate`
//! - an ErrorOutput when the cycle or the narrative fails
//!
//! Logs go to stderr (`RUST_LOG`, default `info`).

mod gemini;
mod http;

use std::io::{self, BufWriter, Write};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use traffic_engine::types::ErrorOutput;
use traffic_engine::{
  Engine, EngineError, FileSource, NarrativeState, TableSource, TrendRange,
};

use gemini::{GeminiNarrator, GEMINI_API_KEY_ENV, GEMINI_DEFAULT_MODEL};
use http::{is_url, HttpSource};

/// Weekly traffic KPIs, surge/drop alerts, and evidence summary from a CSV sheet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// CSV export URL or local path of the weekly traffic sheet
  #[arg(short, long)]
  source: String,

  /// Week label to report on (default: most recent week)
  #[arg(short, long)]
  week: Option<String>,

  /// Only list the available weeks, most recent first
  #[arg(long)]
  list_weeks: bool,

  /// Also emit trend series for a window: year, half, or quarter
  #[arg(long)]
  range: Option<TrendRange>,

  /// Generate the narrative report from the evidence summary
  #[arg(long)]
  narrate: bool,

  /// Narrative model name
  #[arg(long, default_value = GEMINI_DEFAULT_MODEL)]
  model: String,

  /// Environment variable holding the narrative API key
  #[arg(long, default_value = GEMINI_API_KEY_ENV)]
  api_key_env: String,

  /// Timeout for each external call, in seconds
  #[arg(long, default_value_t = 30)]
  timeout_secs: u64,
}

#[derive(Serialize)]
struct WeeksOutput<'a> {
  weeks: &'a [String],
}

#[derive(Serialize)]
struct NarrativeOutput<'a> {
  report_id: &'a str,
  narrative: &'a str,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();
  if let Err(e) = run(&args) {
    let _ = writeln!(io::stderr(), "traffic-report: {:#}", e);
    process::exit(1);
  }
}

fn run(args: &Args) -> Result<()> {
  let stdout = io::stdout();
  let mut out = BufWriter::new(stdout.lock());
  let timeout = Duration::from_secs(args.timeout_secs);

  let source: Box<dyn TableSource> = if is_url(&args.source) {
    Box::new(HttpSource::new(timeout)?)
  } else {
    Box::new(FileSource)
  };

  let mut engine = Engine::with_defaults();
  let cycle = engine
    .load(source.as_ref(), &args.source, Utc::now())
    .and_then(|table| {
      let weeks = engine.weeks(&table);
      if args.list_weeks {
        return Ok((table, weeks, None));
      }
      let report = engine.analyze(&table, args.week.as_deref())?;
      Ok((table, weeks, Some(report)))
    });

  let (table, weeks, report) = match cycle {
    Ok(v) => v,
    Err(e) => {
      emit(&mut out, &cycle_error(&e))?;
      out.flush()?;
      return Err(e).context("computation cycle failed");
    }
  };

  let report = match report {
    Some(r) => r,
    None => {
      emit(&mut out, &WeeksOutput { weeks: &weeks })?;
      out.flush()?;
      return Ok(());
    }
  };
  emit(&mut out, &report)?;

  if let Some(range) = args.range {
    emit(&mut out, &engine.trend(&table, range, &report.week))?;
  }

  if args.narrate {
    let mut state = NarrativeState::default();
    let generated = GeminiNarrator::from_env_key(&args.api_key_env, args.model.clone(), timeout)
      .and_then(|narrator| {
        state
          .get_or_generate(&report.summary, &narrator, &engine.config().report_language)
          .map(str::to_string)
      });
    match generated {
      Ok(text) => emit(
        &mut out,
        &NarrativeOutput {
          report_id: &report.summary.report_id,
          narrative: &text,
        },
      )?,
      Err(e) => {
        // KPI and alert output above stays valid.
        warn!(error = %e, "narrative unavailable");
        emit(&mut out, &ErrorOutput::new(e.to_string()).with_field("narrative"))?;
      }
    }
  }

  info!(week = %report.week, alerts = report.summary.alerts.len(), "done");
  out.flush()?;
  Ok(())
}

fn cycle_error(e: &EngineError) -> ErrorOutput {
  match e {
    EngineError::Validation { field, reason } => ErrorOutput::new(reason.clone()).with_field(field.clone()),
    EngineError::SourceUnavailable { .. } | EngineError::Csv(_) => {
      ErrorOutput::new(e.to_string()).with_field("source")
    }
    _ => ErrorOutput::new(e.to_string()),
  }
}

fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
  serde_json::to_writer(&mut *out, value)?;
  writeln!(out)?;
  Ok(())
}
