//! Synchronization gate — warm-up suppression for progress counting.
//!
//! Fast sources have a structural head start: they see events before slow
//! sources have finished connecting, so the head of the stream would be
//! measured as "missing" purely from timing skew. The gate keeps progress
//! counters frozen until at least `quorum` sources have jointly observed the
//! same transaction hash, then opens permanently.
//!
//! # Invariants
//!
//! - **Sticky**: once open, the gate never closes; the joint-observation map
//!   is dropped at that point.
//! - **Per-source dedup**: a source observing the same hash twice contributes
//!   one vote, not two.
//! - **`quorum <= 1` is always open** (the simple variant of the engine).
//! - **Pure, no IO**: the caller provides observations and reads the decision.

use std::collections::{BTreeMap, BTreeSet};

use txp_core::{SourceId, TxHash};

/// Quorum gate over joint hash observations.
#[derive(Clone, Debug)]
pub struct SyncGate {
    quorum: usize,
    open: bool,
    /// Sources that have observed each hash. Only populated while closed.
    seen: BTreeMap<TxHash, BTreeSet<SourceId>>,
}

impl SyncGate {
    pub fn new(quorum: usize) -> Self {
        Self {
            quorum,
            open: quorum <= 1,
            seen: BTreeMap::new(),
        }
    }

    /// Record that `source` observed `hash`, then report whether the gate is
    /// open. The observation that completes the quorum opens the gate for the
    /// record that carried it.
    pub fn observe(&mut self, hash: &TxHash, source: &SourceId) -> bool {
        if self.open {
            return true;
        }
        let sources = self.seen.entry(hash.clone()).or_default();
        sources.insert(source.clone());
        if sources.len() >= self.quorum {
            self.open = true;
            self.seen.clear();
        }
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
