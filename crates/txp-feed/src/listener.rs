//! Source listener — one per feed, the only writer into the accumulator.
//!
//! The loop: pull a raw payload, decode strictly, record, stop at target.
//! Malformed payloads are logged and dropped; transport failure propagates
//! (fatal to the run). Completion happens exactly once: the future resolves
//! with a summary or rejects with the error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use txp_core::{EventRecord, SourceId};
use txp_engine::{FlatAccumulator, KeyedAccumulator, RecordOutcome};

use crate::decode::decode_log;
use crate::error::FeedError;
use crate::feed::{EventFeed, EventFilter};

/// Handle to the run's accumulator. Listeners submit through this; the Mutex
/// serializes record/read sequences across concurrently-polled listeners.
#[derive(Clone)]
pub enum SharedAccumulator {
    Keyed(Arc<Mutex<KeyedAccumulator>>),
    Flat(Arc<Mutex<FlatAccumulator>>),
}

impl SharedAccumulator {
    pub async fn source_done(&self, source: &SourceId) -> bool {
        match self {
            SharedAccumulator::Keyed(acc) => acc.lock().await.source_done(source),
            SharedAccumulator::Flat(acc) => acc.lock().await.source_done(source),
        }
    }

    /// Record one decoded event. In a keyed run an event without a block
    /// number cannot be bucketed and counts as malformed.
    async fn record(&self, ev: &EventRecord) -> Result<RecordOutcome, FeedError> {
        match self {
            SharedAccumulator::Keyed(acc) => {
                let block = ev.block.ok_or_else(|| {
                    FeedError::Malformed("event without blockNumber in keyed run".to_string())
                })?;
                Ok(acc.lock().await.record(block, &ev.source, ev.tx_hash.clone()))
            }
            SharedAccumulator::Flat(acc) => {
                Ok(acc.lock().await.record(&ev.source, ev.tx_hash.clone()))
            }
        }
    }
}

/// What one listener saw over its lifetime, for the final report log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSummary {
    pub source: SourceId,
    /// Raw payloads delivered by the feed.
    pub delivered: usize,
    /// Payloads dropped by the strict decode.
    pub malformed: usize,
    /// Records that advanced the gated progress counter.
    pub counted: usize,
}

/// Drive one feed to its target count.
///
/// Subscribes, records every decodable payload, and returns once the
/// accumulator reports the source's counter reached the target. The
/// unsubscribe on the way out is best-effort.
pub async fn run_listener(
    mut feed: Box<dyn EventFeed>,
    filter: EventFilter,
    acc: SharedAccumulator,
) -> Result<ListenerSummary, FeedError> {
    feed.subscribe(&filter).await?;
    let source = feed.label().clone();
    info!(source = %source, "subscribed");

    let mut summary = ListenerSummary {
        source: source.clone(),
        delivered: 0,
        malformed: 0,
        counted: 0,
    };

    loop {
        // Cooperative cancellation may deliver a few extra events after the
        // target; re-check before processing so they are safely ignored.
        if acc.source_done(&source).await {
            break;
        }

        let Some(payload) = feed.next_raw().await? else {
            return Err(FeedError::Transport(format!(
                "{source}: stream closed before target count"
            )));
        };
        summary.delivered += 1;

        let ev = match decode_log(&source, &payload) {
            Ok(ev) => ev,
            Err(e) => {
                warn!(source = %source, error = %e, "dropping malformed payload");
                summary.malformed += 1;
                continue;
            }
        };

        match acc.record(&ev).await {
            Ok(outcome) => {
                if outcome.counted {
                    summary.counted += 1;
                }
                if outcome.reached_target {
                    break;
                }
            }
            Err(e) => {
                warn!(source = %source, error = %e, "dropping malformed payload");
                summary.malformed += 1;
            }
        }
    }

    feed.unsubscribe().await;
    info!(
        source = %source,
        delivered = summary.delivered,
        malformed = summary.malformed,
        counted = summary.counted,
        "listener complete"
    );
    Ok(summary)
}
