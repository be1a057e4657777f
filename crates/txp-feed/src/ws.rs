//! WebSocket subscription client: JSON-RPC 2.0 `eth_subscribe("logs", …)`.
//!
//! One connection per source. Subscription notifications are surfaced as raw
//! `params.result` payloads; the listener owns decoding.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::warn;
use txp_core::SourceId;

use crate::error::FeedError;
use crate::feed::{EventFeed, EventFilter};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsFeed {
    label: SourceId,
    url: String,
    ws: Option<WsStream>,
    sub_id: Option<String>,
    next_id: u64,
    /// Notifications that arrived while waiting for an RPC response.
    pending: VecDeque<Value>,
}

impl WsFeed {
    pub fn new(label: SourceId, url: impl Into<String>) -> Self {
        Self {
            label,
            url: url.into(),
            ws: None,
            sub_id: None,
            next_id: 0,
            pending: VecDeque::new(),
        }
    }

    async fn send_rpc(&mut self, method: &str, params: Value) -> Result<u64, FeedError> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| FeedError::Transport("not connected".to_string()))?;
        self.next_id += 1;
        let id = self.next_id;
        let req = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        ws.send(Message::Text(req.to_string()))
            .await
            .map_err(|e| FeedError::Transport(format!("ws send failed: {e}")))?;
        Ok(id)
    }

    /// Next parsed JSON text frame. Answers pings, skips unparseable frames,
    /// returns `None` on close.
    async fn read_json(&mut self) -> Result<Option<Value>, FeedError> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| FeedError::Transport("not connected".to_string()))?;
        loop {
            let Some(msg) = ws.next().await else {
                return Ok(None);
            };
            match msg.map_err(|e| FeedError::Transport(format!("ws read failed: {e}")))? {
                Message::Text(text) => match serde_json::from_str::<Value>(&text) {
                    Ok(v) => return Ok(Some(v)),
                    Err(e) => {
                        warn!(source = %self.label, error = %e, "skipping non-JSON frame");
                    }
                },
                Message::Ping(data) => {
                    ws.send(Message::Pong(data))
                        .await
                        .map_err(|e| FeedError::Transport(format!("ws pong failed: {e}")))?;
                }
                Message::Close(_) => return Ok(None),
                Message::Binary(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    /// Extract the log payload from an `eth_subscription` notification.
    fn notification_payload(v: &Value) -> Option<Value> {
        if v.get("method").and_then(Value::as_str) != Some("eth_subscription") {
            return None;
        }
        v.pointer("/params/result").cloned()
    }
}

#[async_trait]
impl EventFeed for WsFeed {
    fn label(&self) -> &SourceId {
        &self.label
    }

    async fn subscribe(&mut self, filter: &EventFilter) -> Result<(), FeedError> {
        let (ws, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| FeedError::Transport(format!("ws connect failed: {e}")))?;
        self.ws = Some(ws);

        let topics = match &filter.topic0 {
            Some(t) => json!([t]),
            None => json!([]),
        };
        let id = self
            .send_rpc(
                "eth_subscribe",
                json!(["logs", { "address": filter.address, "topics": topics }]),
            )
            .await?;

        // Read until our subscription confirmation; stash any notifications
        // that race ahead of it.
        loop {
            let Some(v) = self.read_json().await? else {
                return Err(FeedError::Transport(
                    "connection closed during subscribe".to_string(),
                ));
            };
            if v.get("id").and_then(Value::as_u64) == Some(id) {
                if let Some(err) = v.get("error") {
                    return Err(FeedError::Rpc {
                        code: err.get("code").and_then(Value::as_i64),
                        message: err
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("eth_subscribe rejected")
                            .to_string(),
                    });
                }
                let sub = v
                    .get("result")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        FeedError::Transport("eth_subscribe returned no subscription id".to_string())
                    })?;
                self.sub_id = Some(sub.to_string());
                return Ok(());
            }
            if let Some(payload) = Self::notification_payload(&v) {
                self.pending.push_back(payload);
            }
        }
    }

    async fn next_raw(&mut self) -> Result<Option<Value>, FeedError> {
        if let Some(payload) = self.pending.pop_front() {
            return Ok(Some(payload));
        }
        loop {
            let Some(v) = self.read_json().await? else {
                return Ok(None);
            };
            if let Some(payload) = Self::notification_payload(&v) {
                return Ok(Some(payload));
            }
            // RPC responses (e.g. a late unsubscribe ack) fall through here.
        }
    }

    async fn unsubscribe(&mut self) {
        if self.ws.is_some() {
            if let Some(sub) = self.sub_id.take() {
                // Best-effort; a rejected or repeated unsubscribe must not
                // fail the run.
                if let Err(e) = self.send_rpc("eth_unsubscribe", json!([sub])).await {
                    warn!(source = %self.label, error = %e, "eth_unsubscribe failed");
                }
            }
        }
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_payload_extracts_params_result() {
        let v = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": { "subscription": "0xcd0c3e8af590364c09d0fa6a1210faf5", "result": { "transactionHash": "0x01" } }
        });
        let payload = WsFeed::notification_payload(&v).unwrap();
        assert_eq!(payload["transactionHash"], "0x01");
    }

    #[test]
    fn rpc_responses_are_not_notifications() {
        let v = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": "0xabc" });
        assert!(WsFeed::notification_payload(&v).is_none());
    }
}
