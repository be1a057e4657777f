use std::collections::BTreeSet;

use txp_core::{SourceId, TxHash};
use txp_engine::*;

/// A sorted = [h1..h5], B sorted = [h2, h3, h4, h6]: the overlap window is
/// [h2, h4]; both windowed sets are {h2, h3, h4}; h1/h5/h6 fall outside the
/// window and are NOT reported as discrepancies.
#[test]
fn scenario_flat_overlap_boundary() {
    let sources: BTreeSet<SourceId> = [SourceId::new("a"), SourceId::new("b")].into();
    let mut acc = FlatAccumulator::new(sources, 100, 1);
    let a = SourceId::new("a");
    let b = SourceId::new("b");

    for h in ["0xh1", "0xh2", "0xh3", "0xh4", "0xh5"] {
        acc.record(&a, TxHash::new(h));
    }
    for h in ["0xh2", "0xh3", "0xh4", "0xh6"] {
        acc.record(&b, TxHash::new(h));
    }

    let window = overlap_window(&acc).expect("overlap exists");
    assert_eq!(window.reference, a);
    assert_eq!(window.lo, TxHash::new("0xh2"));
    assert_eq!(window.hi, TxHash::new("0xh4"));

    let report = reconcile_flat(&acc, &window);
    assert!(report.consistent);
    assert!(report.discrepancies.is_empty());

    let stats_a = report.sources.iter().find(|s| s.source == a).unwrap();
    let stats_b = report.sources.iter().find(|s| s.source == b).unwrap();
    assert_eq!(stats_a.raw_size, 5);
    assert_eq!(stats_a.windowed_size, 3);
    assert_eq!(stats_b.raw_size, 4);
    assert_eq!(stats_b.windowed_size, 3);
}

/// Same shape but with a real asymmetry inside the window.
#[test]
fn scenario_flat_discrepancy_inside_window() {
    let sources: BTreeSet<SourceId> = [SourceId::new("a"), SourceId::new("b")].into();
    let mut acc = FlatAccumulator::new(sources, 100, 1);
    let a = SourceId::new("a");
    let b = SourceId::new("b");

    for h in ["0xh1", "0xh2", "0xh3", "0xh4"] {
        acc.record(&a, TxHash::new(h));
    }
    // B never saw h3 but brackets it within the overlap range.
    for h in ["0xh1", "0xh2", "0xh4"] {
        acc.record(&b, TxHash::new(h));
    }

    let window = overlap_window(&acc).unwrap();
    assert_eq!(window.lo, TxHash::new("0xh1"));
    assert_eq!(window.hi, TxHash::new("0xh4"));

    let report = reconcile_flat(&acc, &window);
    assert!(!report.consistent);
    assert_eq!(report.discrepancies.len(), 1);
    assert_eq!(report.discrepancies[0].hash, TxHash::new("0xh3"));
    assert_eq!(report.discrepancies[0].present_in, a);
    assert_eq!(report.discrepancies[0].missing_from, b);
    assert_eq!(report.missing_between(&a, &b), 1);
    assert_eq!(report.missing_between(&b, &a), 0);
}
