//! Weekly traffic analytics engine: deterministic, rule-based.
//!
//! Normalizes a weekly traffic sheet, resolves the selected week against its
//! predecessor, computes KPI deltas and per-metric surge/drop alerts, and
//! assembles a self-contained evidence summary for an external narrative
//! generator.
//!
//! No network here; table sources and the narrative generator are ports.

pub mod breakdown;
pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod narrative;
pub mod normalize;
pub mod source;
pub mod summary;
pub mod surge;
pub mod trend;
pub mod types;
pub mod week;

pub use config::{Config, SurgeRule};
pub use engine::Engine;
pub use error::{EngineError, NarrativeError};
pub use metrics::Metric;
pub use narrative::{NarrativePort, NarrativeRequest, NarrativeState};
pub use source::{FileSource, TableCache, TableSource};
pub use trend::TrendRange;
pub use types::{EvidenceSummary, NormalizedTable, RawTable, RawValue, WeeklyReport};
