//! Set reconciliation — per-pair missing events inside the stable window.
//!
//! For every ordered source pair (X, Y), X ≠ Y, report each hash in X's
//! windowed set absent from Y's. Output ordering is stable: discrepancies and
//! pair totals are sorted, and pairs with zero missing are still listed.

use std::collections::{BTreeMap, BTreeSet};

use txp_core::{SourceId, TxHash};

use crate::accumulator::{FlatAccumulator, KeyedAccumulator};
use crate::report::{Discrepancy, PairMissing, ParityReport, SourceStats, WindowSummary};
use crate::window::{OverlapWindow, StableWindow};

/// Ordered-pair totals seeded at zero for the whole universe, then bumped
/// per discrepancy. Deterministic output for deterministic input.
fn pair_totals(sources: &BTreeSet<SourceId>, discrepancies: &[Discrepancy]) -> Vec<PairMissing> {
    let mut totals: BTreeMap<(SourceId, SourceId), usize> = BTreeMap::new();
    for x in sources {
        for y in sources {
            if x != y {
                totals.insert((x.clone(), y.clone()), 0);
            }
        }
    }
    for d in discrepancies {
        if let Some(t) = totals.get_mut(&(d.present_in.clone(), d.missing_from.clone())) {
            *t += 1;
        }
    }
    totals
        .into_iter()
        .map(|((present_in, missing_from), missing)| PairMissing {
            present_in,
            missing_from,
            missing,
        })
        .collect()
}

fn build_report(
    window: WindowSummary,
    sources: Vec<SourceStats>,
    mut discrepancies: Vec<Discrepancy>,
    universe: &BTreeSet<SourceId>,
) -> ParityReport {
    discrepancies.sort();
    let pair_missing = pair_totals(universe, &discrepancies);
    ParityReport {
        consistent: discrepancies.is_empty(),
        window,
        sources,
        pair_missing,
        discrepancies,
    }
}

/// Keyed reconciliation: all per-source sets for every window block must be
/// pairwise equal; any asymmetry is a discrepancy attributed to its block.
pub fn reconcile_keyed(acc: &KeyedAccumulator, window: &StableWindow) -> ParityReport {
    let universe = acc.sources().clone();
    let mut discrepancies = Vec::new();

    for block in &window.blocks {
        let Some(entry) = acc.entries().get(block) else {
            continue;
        };
        for x in &universe {
            for y in &universe {
                if x == y {
                    continue;
                }
                let xs = &entry[x];
                let ys = &entry[y];
                for hash in xs.difference(ys) {
                    discrepancies.push(Discrepancy {
                        block: Some(*block),
                        hash: hash.clone(),
                        present_in: x.clone(),
                        missing_from: y.clone(),
                    });
                }
            }
        }
    }

    let in_window: BTreeSet<u64> = window.blocks.iter().copied().collect();
    let stats = universe
        .iter()
        .map(|s| {
            let mut raw = 0;
            let mut windowed = 0;
            for (block, entry) in acc.entries() {
                let n = entry[s].len();
                raw += n;
                if in_window.contains(block) {
                    windowed += n;
                }
            }
            SourceStats {
                source: s.clone(),
                raw_size: raw,
                windowed_size: windowed,
            }
        })
        .collect();

    build_report(
        WindowSummary::Keyed {
            boundary: window.boundary,
            blocks: window.blocks.clone(),
        },
        stats,
        discrepancies,
        &universe,
    )
}

/// Flat reconciliation: restrict each source's set to the inclusive `[lo, hi]`
/// range by the deterministic hash order, then diff every ordered pair.
pub fn reconcile_flat(acc: &FlatAccumulator, window: &OverlapWindow) -> ParityReport {
    let universe = acc.sources();

    let windowed: BTreeMap<SourceId, BTreeSet<TxHash>> = acc
        .sets()
        .iter()
        .map(|(s, set)| {
            let w = set
                .range(window.lo.clone()..=window.hi.clone())
                .cloned()
                .collect();
            (s.clone(), w)
        })
        .collect();

    let mut discrepancies = Vec::new();
    for x in &universe {
        for y in &universe {
            if x == y {
                continue;
            }
            for hash in windowed[x].difference(&windowed[y]) {
                discrepancies.push(Discrepancy {
                    block: None,
                    hash: hash.clone(),
                    present_in: x.clone(),
                    missing_from: y.clone(),
                });
            }
        }
    }

    let stats = universe
        .iter()
        .map(|s| SourceStats {
            source: s.clone(),
            raw_size: acc.set(s).map(|set| set.len()).unwrap_or(0),
            windowed_size: windowed[s].len(),
        })
        .collect();

    build_report(
        WindowSummary::Flat {
            reference: window.reference.clone(),
            lo: window.lo.clone(),
            hi: window.hi.clone(),
        },
        stats,
        discrepancies,
        &universe,
    )
}
