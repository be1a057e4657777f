use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{json, Value};
use txp_config::RunMode;
use txp_core::SourceId;
use txp_feed::{EventFeed, EventFilter, FeedError};
use txp_runner::{CoordinatorConfig, RunCoordinator, RunOutcome};

struct ScriptedFeed {
    label: SourceId,
    events: VecDeque<Value>,
    fail_subscribe: bool,
}

impl ScriptedFeed {
    fn new(label: &str, events: Vec<Value>) -> Box<dyn EventFeed> {
        Box::new(Self {
            label: SourceId::new(label),
            events: events.into(),
            fail_subscribe: false,
        })
    }

    fn failing(label: &str) -> Box<dyn EventFeed> {
        Box::new(Self {
            label: SourceId::new(label),
            events: VecDeque::new(),
            fail_subscribe: true,
        })
    }
}

#[async_trait]
impl EventFeed for ScriptedFeed {
    fn label(&self) -> &SourceId {
        &self.label
    }

    async fn subscribe(&mut self, _filter: &EventFilter) -> Result<(), FeedError> {
        if self.fail_subscribe {
            return Err(FeedError::Transport("connect refused".to_string()));
        }
        Ok(())
    }

    async fn next_raw(&mut self) -> Result<Option<Value>, FeedError> {
        Ok(self.events.pop_front())
    }

    async fn unsubscribe(&mut self) {}
}

fn log(block: u64, hash: &str) -> Value {
    json!({ "blockNumber": format!("0x{block:x}"), "transactionHash": hash })
}

fn flat_log(hash: &str) -> Value {
    json!({ "transactionHash": hash })
}

fn config(target_count: usize, mode: RunMode) -> CoordinatorConfig {
    CoordinatorConfig {
        filter: EventFilter {
            address: "0xcontract".to_string(),
            topic0: Some("0xddf252ad".to_string()),
        },
        target_count,
        quorum: 1,
        mode,
    }
}

#[tokio::test]
async fn scenario_end_to_end_consistent() {
    let feeds = vec![
        ScriptedFeed::new("a", vec![log(10, "0x01"), log(11, "0x02")]),
        ScriptedFeed::new("b", vec![log(10, "0x01"), log(11, "0x02")]),
    ];
    let record = RunCoordinator::new(config(2, RunMode::Keyed))
        .run(feeds)
        .await
        .unwrap();

    assert!(record.outcome.is_consistent());
    assert_eq!(record.outcome.exit_code(), 0);
    assert_eq!(record.listeners.len(), 2);
    assert!(record.listeners.iter().all(|l| l.counted == 2));
    assert!(record.snapshot.keyed.is_some());
}

#[tokio::test]
async fn scenario_inconsistency_is_a_result_not_an_error() {
    // Block 9 completes the warm-up boundary; block 10 disagrees.
    let feeds = vec![
        ScriptedFeed::new("a", vec![log(9, "0x00"), log(10, "0x01"), log(10, "0x02")]),
        ScriptedFeed::new("b", vec![log(9, "0x00"), log(10, "0x01"), log(10, "0x03")]),
    ];
    let record = RunCoordinator::new(config(3, RunMode::Keyed))
        .run(feeds)
        .await
        .unwrap();

    let RunOutcome::Compared { report } = &record.outcome else {
        panic!("expected a completed comparison, got {:?}", record.outcome);
    };
    assert!(!report.consistent);
    assert_eq!(report.discrepancies.len(), 2);
    // A completed comparison exits 0 even when sources disagree.
    assert_eq!(record.outcome.exit_code(), 0);
}

#[tokio::test]
async fn scenario_fatal_listener_aborts_whole_run() {
    let feeds = vec![
        ScriptedFeed::new("a", vec![log(10, "0x01")]),
        ScriptedFeed::failing("b"),
    ];
    let err = RunCoordinator::new(config(1, RunMode::Keyed))
        .run(feeds)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("listener failed"));
}

#[tokio::test]
async fn scenario_insufficient_data_terminal() {
    // Disjoint block ranges: no block is ever complete.
    let feeds = vec![
        ScriptedFeed::new("a", vec![log(10, "0x01"), log(11, "0x02")]),
        ScriptedFeed::new("b", vec![log(20, "0x03"), log(21, "0x04")]),
    ];
    let record = RunCoordinator::new(config(2, RunMode::Keyed))
        .run(feeds)
        .await
        .unwrap();

    assert!(matches!(
        record.outcome,
        RunOutcome::InsufficientData { .. }
    ));
    assert_eq!(record.outcome.exit_code(), 2);
    assert!(!record.outcome.is_consistent());
}

#[tokio::test]
async fn scenario_flat_mode_end_to_end() {
    let feeds = vec![
        ScriptedFeed::new(
            "a",
            vec![
                flat_log("0xh1"),
                flat_log("0xh2"),
                flat_log("0xh3"),
                flat_log("0xh4"),
                flat_log("0xh5"),
            ],
        ),
        ScriptedFeed::new(
            "b",
            vec![
                flat_log("0xh2"),
                flat_log("0xh3"),
                flat_log("0xh4"),
                flat_log("0xh6"),
            ],
        ),
    ];
    // Both stop at 4; feed a's trailing 0xh5 is never consumed.
    let record = RunCoordinator::new(config(4, RunMode::Flat))
        .run(feeds)
        .await
        .unwrap();

    let RunOutcome::Compared { report } = &record.outcome else {
        panic!("expected comparison");
    };
    assert!(report.consistent);
    assert!(record.snapshot.flat.is_some());
}

#[tokio::test]
async fn scenario_coordinator_requires_two_unique_sources() {
    let one = vec![ScriptedFeed::new("a", vec![])];
    assert!(RunCoordinator::new(config(1, RunMode::Keyed))
        .run(one)
        .await
        .is_err());

    let dup = vec![
        ScriptedFeed::new("a", vec![log(1, "0x01")]),
        ScriptedFeed::new("a", vec![log(1, "0x01")]),
    ];
    assert!(RunCoordinator::new(config(1, RunMode::Keyed))
        .run(dup)
        .await
        .is_err());
}
