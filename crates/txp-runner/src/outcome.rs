//! Run outcomes and the final run record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use txp_engine::{AccumulatorSnapshot, ParityReport};
use txp_feed::ListenerSummary;
use uuid::Uuid;

/// Terminal outcome of a run that did not fail fatally.
///
/// Inconsistency is the engine's positive detection result, not an error:
/// a completed comparison exits 0 either way. Insufficient data is its own
/// designed terminal — "run again with a larger target count".
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Compared { report: ParityReport },
    InsufficientData { reason: String },
}

impl RunOutcome {
    pub fn is_consistent(&self) -> bool {
        matches!(self, RunOutcome::Compared { report } if report.consistent)
    }

    /// Process exit status: 0 completed comparison, 2 insufficient data.
    /// (Fatal failures never produce an outcome; the binary maps those to 1.)
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Compared { .. } => 0,
            RunOutcome::InsufficientData { .. } => 2,
        }
    }
}

/// Everything the run produced: attribution, per-listener stats, the full
/// accumulator dump, and the outcome. Serialized as the machine-parseable
/// report.
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub started_at_utc: DateTime<Utc>,
    pub finished_at_utc: DateTime<Utc>,
    pub listeners: Vec<ListenerSummary>,
    pub snapshot: AccumulatorSnapshot,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}
