//! txp-engine
//!
//! Multi-source event reconciliation core.
//!
//! Architectural decisions:
//! - Duplicate identity keys never advance progress (suppression, not counting)
//! - Eager per-source initialization: "not yet reported" is never "reported empty"
//! - Warm-up gate is an explicit tunable policy, not ad hoc shared flags
//! - Comparison only inside the stable window; no window means InsufficientData
//! - Inconsistency is the detection result, not an error
//!
//! Pure deterministic logic. No IO, no clock, no locks. The host serializes
//! mutation (the runner wraps the accumulator in a Mutex).

mod accumulator;
mod gate;
mod reconcile;
mod report;
mod window;

pub use accumulator::{FlatAccumulator, KeyedAccumulator, RecordOutcome};
pub use gate::SyncGate;
pub use reconcile::{reconcile_flat, reconcile_keyed};
pub use report::{
    AccumulatorSnapshot, Discrepancy, PairMissing, ParityReport, SourceStats, WindowSummary,
};
pub use window::{overlap_window, stable_window, OverlapWindow, StableWindow};
