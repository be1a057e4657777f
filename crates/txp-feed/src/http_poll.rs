//! HTTP polling client: JSON-RPC `eth_blockNumber` + `eth_getLogs`.
//!
//! For providers without a streaming endpoint. Polls the head block on an
//! interval and pages logs for each newly-sealed block range, emitting each
//! log once. Duplicate delivery across a provider hiccup is harmless — the
//! accumulator suppresses by hash.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use txp_core::SourceId;

use crate::decode::decode_quantity;
use crate::error::FeedError;
use crate::feed::{EventFeed, EventFilter};

pub struct HttpPollFeed {
    label: SourceId,
    url: String,
    client: reqwest::Client,
    poll_interval: Duration,
    filter: Option<EventFilter>,
    /// Last block whose logs were emitted; polling resumes strictly after it.
    last_block: Option<u64>,
    pending: VecDeque<Value>,
    next_id: u64,
}

impl HttpPollFeed {
    pub fn new(label: SourceId, url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            label,
            url: url.into(),
            client: reqwest::Client::new(),
            poll_interval,
            filter: None,
            last_block: None,
            pending: VecDeque::new(),
            next_id: 0,
        }
    }

    async fn rpc(&mut self, method: &str, params: Value) -> Result<Value, FeedError> {
        self.next_id += 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("rpc request failed: {e}")))?;
        let v: Value = resp
            .json()
            .await
            .map_err(|e| FeedError::Transport(format!("rpc response not JSON: {e}")))?;
        if let Some(err) = v.get("error") {
            return Err(FeedError::Rpc {
                code: err.get("code").and_then(Value::as_i64),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("rpc error")
                    .to_string(),
            });
        }
        v.get("result")
            .cloned()
            .ok_or_else(|| FeedError::Transport("rpc response missing result".to_string()))
    }

    async fn head_block(&mut self) -> Result<u64, FeedError> {
        let result = self.rpc("eth_blockNumber", json!([])).await?;
        decode_quantity(&result)
    }
}

#[async_trait]
impl EventFeed for HttpPollFeed {
    fn label(&self) -> &SourceId {
        &self.label
    }

    async fn subscribe(&mut self, filter: &EventFilter) -> Result<(), FeedError> {
        self.filter = Some(filter.clone());
        // Anchor at the current head so collection starts with live blocks,
        // the same stream position a WebSocket subscription would see.
        let head = self.head_block().await?;
        self.last_block = Some(head);
        Ok(())
    }

    async fn next_raw(&mut self) -> Result<Option<Value>, FeedError> {
        loop {
            if let Some(payload) = self.pending.pop_front() {
                return Ok(Some(payload));
            }
            let filter = self
                .filter
                .clone()
                .ok_or_else(|| FeedError::Config("next_raw before subscribe".to_string()))?;

            tokio::time::sleep(self.poll_interval).await;

            let head = self.head_block().await?;
            let from = match self.last_block {
                Some(b) if head > b => b + 1,
                Some(_) => continue,
                None => head,
            };
            let topics = match &filter.topic0 {
                Some(t) => json!([t]),
                None => json!([]),
            };
            let result = self
                .rpc(
                    "eth_getLogs",
                    json!([{
                        "fromBlock": format!("0x{from:x}"),
                        "toBlock": format!("0x{head:x}"),
                        "address": filter.address,
                        "topics": topics,
                    }]),
                )
                .await?;
            if let Value::Array(logs) = result {
                self.pending.extend(logs);
            }
            self.last_block = Some(head);
        }
    }

    async fn unsubscribe(&mut self) {
        // No upstream subscription state to tear down.
        self.filter = None;
        self.pending.clear();
    }
}
