//! Shared accumulators — the single owner of per-run event state.
//!
//! Two shapes, matching the two comparison strategies:
//!
//! - [`KeyedAccumulator`]: block → (source → set of hashes). Blocks are
//!   eagerly initialized with an empty set for every known source so that
//!   "this source has not reported this block" is structurally distinct from
//!   "reported zero events".
//! - [`FlatAccumulator`]: source → set of hashes, for feeds with no usable
//!   correlation key; comparison later relies on an overlapping hash range.
//!
//! Both are pure `&mut self` state machines. Listeners submit through
//! `record`; the host serializes calls (Mutex in the runner).

use std::collections::{BTreeMap, BTreeSet};

use txp_core::{SourceId, TxHash};

use crate::gate::SyncGate;
use crate::report::AccumulatorSnapshot;

/// What a single `record` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The hash was not previously in this source's set (a duplicate leaves
    /// the structure untouched).
    pub new_for_source: bool,
    /// The per-source progress counter advanced (new hash AND gate open).
    pub counted: bool,
    /// This call brought the source's counter to the target — the listener's
    /// stop signal.
    pub reached_target: bool,
}

impl RecordOutcome {
    fn ignored() -> Self {
        Self {
            new_for_source: false,
            counted: false,
            reached_target: false,
        }
    }
}

/// Per-source progress toward the stop threshold.
#[derive(Clone, Debug)]
struct ProgressLedger {
    target_count: usize,
    counts: BTreeMap<SourceId, usize>,
}

impl ProgressLedger {
    fn new(sources: &BTreeSet<SourceId>, target_count: usize) -> Self {
        Self {
            target_count,
            counts: sources.iter().map(|s| (s.clone(), 0)).collect(),
        }
    }

    /// Advance `source` by one; returns whether this step hit the target.
    fn advance(&mut self, source: &SourceId) -> bool {
        let c = self.counts.entry(source.clone()).or_insert(0);
        *c += 1;
        *c == self.target_count
    }

    fn done(&self, source: &SourceId) -> bool {
        self.counts
            .get(source)
            .is_some_and(|c| *c >= self.target_count)
    }
}

// ---------------------------------------------------------------------------
// Keyed accumulator
// ---------------------------------------------------------------------------

/// Block-keyed accumulator: block → (source → set of hashes).
#[derive(Clone, Debug)]
pub struct KeyedAccumulator {
    sources: BTreeSet<SourceId>,
    entries: BTreeMap<u64, BTreeMap<SourceId, BTreeSet<TxHash>>>,
    ledger: ProgressLedger,
    gate: SyncGate,
}

impl KeyedAccumulator {
    /// `quorum <= 1` leaves the warm-up gate permanently open.
    pub fn new(sources: BTreeSet<SourceId>, target_count: usize, quorum: usize) -> Self {
        let ledger = ProgressLedger::new(&sources, target_count);
        Self {
            sources,
            entries: BTreeMap::new(),
            ledger,
            gate: SyncGate::new(quorum),
        }
    }

    /// Record one observation. A hash already present for this source is a
    /// duplicate: no structural mutation, no progress. New hashes are always
    /// stored; they count toward progress only while the gate is open.
    ///
    /// Records from a source outside the fixed universe are ignored.
    pub fn record(&mut self, block: u64, source: &SourceId, hash: TxHash) -> RecordOutcome {
        if !self.sources.contains(source) {
            return RecordOutcome::ignored();
        }

        let entry = self.entries.entry(block).or_insert_with(|| {
            self.sources
                .iter()
                .map(|s| (s.clone(), BTreeSet::new()))
                .collect()
        });

        // Universe is fixed at construction, so the source key exists.
        let set = entry
            .get_mut(source)
            .expect("source present after eager init");
        let new_for_source = set.insert(hash.clone());

        // Duplicates still vote on the gate: the source has observed the hash.
        let gate_open = self.gate.observe(&hash, source);

        let (mut counted, mut reached_target) = (false, false);
        if new_for_source && gate_open {
            counted = true;
            reached_target = self.ledger.advance(source);
        }

        RecordOutcome {
            new_for_source,
            counted,
            reached_target,
        }
    }

    /// `true` once the source's counter has reached the target. Listeners
    /// check this before processing late events after cooperative cancel.
    pub fn source_done(&self, source: &SourceId) -> bool {
        self.ledger.done(source)
    }

    pub fn progress(&self, source: &SourceId) -> usize {
        self.ledger.counts.get(source).copied().unwrap_or(0)
    }

    pub fn sources(&self) -> &BTreeSet<SourceId> {
        &self.sources
    }

    /// Ascending iteration over blocks and their per-source sets.
    pub fn entries(&self) -> &BTreeMap<u64, BTreeMap<SourceId, BTreeSet<TxHash>>> {
        &self.entries
    }

    pub fn gate_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Full-state dump for the final report.
    pub fn snapshot(&self) -> AccumulatorSnapshot {
        AccumulatorSnapshot {
            target_count: self.ledger.target_count,
            progress: self.ledger.counts.clone(),
            keyed: Some(self.entries.clone()),
            flat: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Flat accumulator
// ---------------------------------------------------------------------------

/// Keyless accumulator: source → set of hashes. Eagerly initialized with an
/// empty set per source at construction.
#[derive(Clone, Debug)]
pub struct FlatAccumulator {
    sets: BTreeMap<SourceId, BTreeSet<TxHash>>,
    ledger: ProgressLedger,
    gate: SyncGate,
}

impl FlatAccumulator {
    pub fn new(sources: BTreeSet<SourceId>, target_count: usize, quorum: usize) -> Self {
        let ledger = ProgressLedger::new(&sources, target_count);
        Self {
            sets: sources
                .iter()
                .map(|s| (s.clone(), BTreeSet::new()))
                .collect(),
            ledger,
            gate: SyncGate::new(quorum),
        }
    }

    /// Same contract as [`KeyedAccumulator::record`], minus the block.
    pub fn record(&mut self, source: &SourceId, hash: TxHash) -> RecordOutcome {
        let Some(set) = self.sets.get_mut(source) else {
            return RecordOutcome::ignored();
        };
        let new_for_source = set.insert(hash.clone());
        let gate_open = self.gate.observe(&hash, source);

        let (mut counted, mut reached_target) = (false, false);
        if new_for_source && gate_open {
            counted = true;
            reached_target = self.ledger.advance(source);
        }

        RecordOutcome {
            new_for_source,
            counted,
            reached_target,
        }
    }

    pub fn source_done(&self, source: &SourceId) -> bool {
        self.ledger.done(source)
    }

    pub fn progress(&self, source: &SourceId) -> usize {
        self.ledger.counts.get(source).copied().unwrap_or(0)
    }

    pub fn sources(&self) -> BTreeSet<SourceId> {
        self.sets.keys().cloned().collect()
    }

    pub fn set(&self, source: &SourceId) -> Option<&BTreeSet<TxHash>> {
        self.sets.get(source)
    }

    pub fn sets(&self) -> &BTreeMap<SourceId, BTreeSet<TxHash>> {
        &self.sets
    }

    pub fn gate_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn snapshot(&self) -> AccumulatorSnapshot {
        AccumulatorSnapshot {
            target_count: self.ledger.target_count,
            progress: self.ledger.counts.clone(),
            keyed: None,
            flat: Some(self.sets.clone()),
        }
    }
}
