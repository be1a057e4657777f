use std::collections::BTreeSet;

use txp_core::{SourceId, TxHash};
use txp_engine::*;

#[test]
fn scenario_duplicate_suppression() {
    let sources: BTreeSet<SourceId> = [SourceId::new("a"), SourceId::new("b")].into();
    let mut acc = KeyedAccumulator::new(sources, 10, 1);
    let a = SourceId::new("a");

    let first = acc.record(100, &a, TxHash::new("0xaaaa"));
    assert!(first.new_for_source);
    assert!(first.counted);
    assert_eq!(acc.progress(&a), 1);

    // Same hash again: set size unchanged, counter unchanged.
    let dup = acc.record(100, &a, TxHash::new("0xaaaa"));
    assert!(!dup.new_for_source);
    assert!(!dup.counted);
    assert_eq!(acc.progress(&a), 1);
    assert_eq!(acc.entries()[&100][&a].len(), 1);

    // Upstream casing differences are still the same identity key.
    let recased = acc.record(100, &a, TxHash::new("0xAAAA"));
    assert!(!recased.new_for_source);
    assert_eq!(acc.progress(&a), 1);
}

#[test]
fn scenario_duplicate_suppression_flat() {
    let sources: BTreeSet<SourceId> = [SourceId::new("a")].into();
    let mut acc = FlatAccumulator::new(sources, 10, 1);
    let a = SourceId::new("a");

    assert!(acc.record(&a, TxHash::new("0x01")).counted);
    assert!(!acc.record(&a, TxHash::new("0x01")).counted);
    assert_eq!(acc.progress(&a), 1);
    assert_eq!(acc.set(&a).unwrap().len(), 1);
}
