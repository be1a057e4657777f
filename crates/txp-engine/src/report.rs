//! Report types — the engine's output surface.
//!
//! Everything is serializable (nested maps to plain objects) so the final
//! dump is both human-readable and machine-parseable. All list fields carry
//! a stable ordering enforced by the reconciler.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use txp_core::{SourceId, TxHash};

/// Full accumulator state at the end of collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorSnapshot {
    pub target_count: usize,
    /// Gated progress per source (counted records, not raw deliveries).
    pub progress: BTreeMap<SourceId, usize>,
    /// Keyed shape: block → source → hashes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<BTreeMap<u64, BTreeMap<SourceId, BTreeSet<TxHash>>>>,
    /// Flat shape: source → hashes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat: Option<BTreeMap<SourceId, BTreeSet<TxHash>>>,
}

/// One detected asymmetry: `hash` seen by `present_in` but absent from
/// `missing_from` inside the comparison window.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Block the hash was recorded under; `None` in the flat variant.
    pub block: Option<u64>,
    pub hash: TxHash,
    pub present_in: SourceId,
    pub missing_from: SourceId,
}

/// Missing-event total for one ordered source pair. Pairs with zero missing
/// are included so the report enumerates the whole comparison universe.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairMissing {
    pub present_in: SourceId,
    pub missing_from: SourceId,
    pub missing: usize,
}

/// Per-source set sizes, raw and (where a window applies) windowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: SourceId,
    /// Distinct hashes recorded for this source across the whole run.
    pub raw_size: usize,
    /// Distinct hashes inside the comparison window.
    pub windowed_size: usize,
}

/// The comparison window the report was computed over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSummary {
    /// Blocks strictly after the first complete block.
    Keyed { boundary: u64, blocks: Vec<u64> },
    /// Inclusive hash range common to all sources, anchored on `reference`.
    Flat {
        reference: SourceId,
        lo: TxHash,
        hi: TxHash,
    },
}

/// The discrepancy report — the engine's positive detection result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityReport {
    /// `true` iff every ordered-pair missing count is zero.
    pub consistent: bool,
    pub window: WindowSummary,
    pub sources: Vec<SourceStats>,
    pub pair_missing: Vec<PairMissing>,
    pub discrepancies: Vec<Discrepancy>,
}

impl ParityReport {
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Total missing count for one ordered pair, `0` if the pair is unknown.
    pub fn missing_between(&self, present_in: &SourceId, missing_from: &SourceId) -> usize {
        self.pair_missing
            .iter()
            .find(|p| &p.present_in == present_in && &p.missing_from == missing_from)
            .map(|p| p.missing)
            .unwrap_or(0)
    }
}
