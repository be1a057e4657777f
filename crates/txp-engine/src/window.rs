//! Stability detection — where is comparison safe?
//!
//! Comparing a region some sources have not caught up to produces false
//! "missing" results from timing skew, not real inconsistency. This module
//! finds the region where every source has reported.
//!
//! - Keyed: a block is *complete* once every source's set for it is
//!   non-empty. The window is every block **strictly after** the first
//!   complete block (the boundary itself is excluded as warm-up). No complete
//!   block ⇒ `None` (the InsufficientData outcome).
//! - Flat: the window is the inclusive range of the reference source's
//!   sorted hashes bounded by the first and last hash present in every other
//!   source. Either bound missing ⇒ `None` (no overlap).

use txp_core::{SourceId, TxHash};

use crate::accumulator::{FlatAccumulator, KeyedAccumulator};

/// Keyed comparison window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableWindow {
    /// First complete block. Excluded from comparison by convention.
    pub boundary: u64,
    /// Blocks strictly after the boundary, ascending.
    pub blocks: Vec<u64>,
}

/// Find the keyed window, or `None` if no block is complete.
pub fn stable_window(acc: &KeyedAccumulator) -> Option<StableWindow> {
    let boundary = acc
        .entries()
        .iter()
        .find(|(_, by_source)| by_source.values().all(|set| !set.is_empty()))
        .map(|(block, _)| *block)?;

    let blocks = acc
        .entries()
        .keys()
        .copied()
        .filter(|b| *b > boundary)
        .collect();

    Some(StableWindow { boundary, blocks })
}

/// Flat comparison window: inclusive hash range common to all sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlapWindow {
    /// Source whose sorted sequence anchored the scan (lowest SourceId).
    pub reference: SourceId,
    pub lo: TxHash,
    pub hi: TxHash,
}

/// Scan the reference source's sorted hashes forward for the first hash
/// present in every other source, and backward for the last. `None` when
/// either scan fails (no overlapping range exists).
pub fn overlap_window(acc: &FlatAccumulator) -> Option<OverlapWindow> {
    let sources = acc.sources();
    let reference = sources.iter().next()?.clone();
    let ref_set = acc.set(&reference)?;

    let others: Vec<_> = sources
        .iter()
        .filter(|s| **s != reference)
        .filter_map(|s| acc.set(s))
        .collect();

    let in_all = |h: &&TxHash| others.iter().all(|o| o.contains(*h));

    let lo = ref_set.iter().find(in_all)?.clone();
    let hi = ref_set.iter().rev().find(in_all)?.clone();

    Some(OverlapWindow { reference, lo, hi })
}
