use std::collections::BTreeSet;

use txp_core::{SourceId, TxHash};
use txp_engine::*;

fn universe() -> BTreeSet<SourceId> {
    [SourceId::new("fast"), SourceId::new("slow")].into()
}

/// With quorum 2 the gate stays closed while only the fast source is
/// reporting: its head-of-stream records are stored but never advance the
/// progress counter. The record completing the joint observation opens the
/// gate and counts.
#[test]
fn scenario_gate_suppresses_head_of_stream() {
    let mut acc = KeyedAccumulator::new(universe(), 10, 2);
    let fast = SourceId::new("fast");
    let slow = SourceId::new("slow");

    // Fast source races ahead before the slow one has connected.
    let o1 = acc.record(100, &fast, TxHash::new("0x01"));
    let o2 = acc.record(100, &fast, TxHash::new("0x02"));
    assert!(o1.new_for_source && !o1.counted);
    assert!(o2.new_for_source && !o2.counted);
    assert_eq!(acc.progress(&fast), 0);
    assert!(!acc.gate_open());
    // The data itself is kept (the window logic decides what to compare).
    assert_eq!(acc.entries()[&100][&fast].len(), 2);

    // Slow source comes up and jointly observes 0x02: gate opens, and the
    // opening record counts toward the slow source.
    let joint = acc.record(100, &slow, TxHash::new("0x02"));
    assert!(joint.counted);
    assert!(acc.gate_open());
    assert_eq!(acc.progress(&slow), 1);

    // From here on everything counts for everyone.
    assert!(acc.record(101, &fast, TxHash::new("0x03")).counted);
    assert_eq!(acc.progress(&fast), 1);
}

/// Same policy without a correlation key: with quorum 2 the flat
/// accumulator stores head-of-stream hashes but keeps counters frozen until
/// a joint observation opens the gate.
#[test]
fn scenario_gate_suppresses_flat_head_of_stream() {
    let mut acc = FlatAccumulator::new(universe(), 10, 2);
    let fast = SourceId::new("fast");
    let slow = SourceId::new("slow");

    let o1 = acc.record(&fast, TxHash::new("0x01"));
    let o2 = acc.record(&fast, TxHash::new("0x02"));
    assert!(o1.new_for_source && !o1.counted);
    assert!(o2.new_for_source && !o2.counted);
    assert_eq!(acc.progress(&fast), 0);
    assert!(!acc.gate_open());
    assert_eq!(acc.set(&fast).unwrap().len(), 2);

    let joint = acc.record(&slow, TxHash::new("0x02"));
    assert!(joint.counted);
    assert!(acc.gate_open());
    assert_eq!(acc.progress(&slow), 1);

    assert!(acc.record(&fast, TxHash::new("0x03")).counted);
    assert_eq!(acc.progress(&fast), 1);
}

/// Quorum 1 (the simple variant): the gate never suppresses anything.
#[test]
fn scenario_gate_quorum_one_counts_immediately() {
    let mut acc = KeyedAccumulator::new(universe(), 10, 1);
    let fast = SourceId::new("fast");
    assert!(acc.record(100, &fast, TxHash::new("0x01")).counted);
    assert_eq!(acc.progress(&fast), 1);
}
