//! txp-runner
//!
//! The run coordinator: drives N source listeners to completion behind a
//! fail-fast join barrier, then hands the frozen accumulator to window
//! detection and reconciliation and owns the termination decision
//! (compared vs "insufficient data, retry with more samples").

mod coordinator;
mod outcome;

pub use coordinator::{CoordinatorConfig, RunCoordinator};
pub use outcome::{RunOutcome, RunRecord};
