//! Run coordination: spawn listeners, join, compare.
//!
//! The join barrier is fail-fast: the first listener error aborts the run
//! and drops the remaining listener futures (cooperative cancellation). Only
//! after every listener resolves does the accumulator become read-only and
//! eligible for comparison.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use chrono::Utc;
use futures_util::future::try_join_all;
use tokio::sync::Mutex;
use tracing::info;
use txp_config::RunMode;
use txp_core::SourceId;
use txp_engine::{
    overlap_window, reconcile_flat, reconcile_keyed, stable_window, FlatAccumulator,
    KeyedAccumulator,
};
use txp_feed::{run_listener, EventFeed, EventFilter, SharedAccumulator};
use uuid::Uuid;

use crate::outcome::{RunOutcome, RunRecord};

#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub filter: EventFilter,
    pub target_count: usize,
    pub quorum: usize,
    pub mode: RunMode,
}

pub struct RunCoordinator {
    cfg: CoordinatorConfig,
}

impl RunCoordinator {
    pub fn new(cfg: CoordinatorConfig) -> Self {
        Self { cfg }
    }

    /// Drive all feeds to their target and produce the run record.
    ///
    /// Errors are fatal transport/setup failures; "insufficient data" is a
    /// successful return carrying that outcome.
    pub async fn run(&self, feeds: Vec<Box<dyn EventFeed>>) -> Result<RunRecord> {
        ensure!(feeds.len() >= 2, "need at least two feeds to compare");
        let universe: BTreeSet<SourceId> = feeds.iter().map(|f| f.label().clone()).collect();
        ensure!(
            universe.len() == feeds.len(),
            "source labels must be unique"
        );

        let run_id = Uuid::new_v4();
        let started_at_utc = Utc::now();
        info!(
            run_id = %run_id,
            sources = feeds.len(),
            target_count = self.cfg.target_count,
            quorum = self.cfg.quorum,
            mode = ?self.cfg.mode,
            "starting collection"
        );

        let acc = match self.cfg.mode {
            RunMode::Keyed => SharedAccumulator::Keyed(Arc::new(Mutex::new(
                KeyedAccumulator::new(universe, self.cfg.target_count, self.cfg.quorum),
            ))),
            RunMode::Flat => SharedAccumulator::Flat(Arc::new(Mutex::new(
                FlatAccumulator::new(universe, self.cfg.target_count, self.cfg.quorum),
            ))),
        };

        let listeners = feeds
            .into_iter()
            .map(|feed| run_listener(feed, self.cfg.filter.clone(), acc.clone()));
        let summaries = try_join_all(listeners)
            .await
            .map_err(anyhow::Error::from)
            .context("listener failed; aborting run")?;

        // Join barrier passed: the accumulator is read-only from here.
        let (snapshot, outcome) = match &acc {
            SharedAccumulator::Keyed(acc) => {
                let acc = acc.lock().await;
                let snapshot = acc.snapshot();
                let outcome = match stable_window(&acc) {
                    Some(window) => RunOutcome::Compared {
                        report: reconcile_keyed(&acc, &window),
                    },
                    None => RunOutcome::InsufficientData {
                        reason: "no block complete across all sources".to_string(),
                    },
                };
                (snapshot, outcome)
            }
            SharedAccumulator::Flat(acc) => {
                let acc = acc.lock().await;
                let snapshot = acc.snapshot();
                let outcome = match overlap_window(&acc) {
                    Some(window) => RunOutcome::Compared {
                        report: reconcile_flat(&acc, &window),
                    },
                    None => RunOutcome::InsufficientData {
                        reason: "no overlapping hash range across all sources".to_string(),
                    },
                };
                (snapshot, outcome)
            }
        };

        match &outcome {
            RunOutcome::Compared { report } => info!(
                run_id = %run_id,
                consistent = report.consistent,
                discrepancies = report.discrepancies.len(),
                "comparison complete"
            ),
            RunOutcome::InsufficientData { reason } => info!(
                run_id = %run_id,
                reason = %reason,
                "insufficient data; retry with a larger target count"
            ),
        }

        Ok(RunRecord {
            run_id,
            started_at_utc,
            finished_at_utc: Utc::now(),
            listeners: summaries,
            snapshot,
            outcome,
        })
    }
}
