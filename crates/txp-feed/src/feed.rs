//! The opaque-producer contract every concrete client implements.

use async_trait::async_trait;
use serde_json::Value;
use txp_core::SourceId;

use crate::error::FeedError;

/// The shared log filter: one contract, one event signature, applied
/// identically to every source so the comparison universe is meaningful.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFilter {
    /// Contract address, `0x`-prefixed.
    pub address: String,
    /// Event signature topic (`topics[0]`); `None` subscribes to all events
    /// on the contract.
    pub topic0: Option<String>,
}

/// One upstream event source: subscribe, pull raw payloads, unsubscribe.
///
/// Object-safe and `Send` so the coordinator can hold `Box<dyn EventFeed>`
/// per source without knowing the transport.
#[async_trait]
pub trait EventFeed: Send {
    /// The (provider, transport, client) label this feed reports under.
    fn label(&self) -> &SourceId;

    /// Establish the upstream subscription. A failure here is fatal to the
    /// whole run.
    async fn subscribe(&mut self, filter: &EventFilter) -> Result<(), FeedError>;

    /// Next raw payload. `Ok(None)` means the upstream closed the stream.
    /// Payloads are decoded by the listener, not here — feeds stay dumb.
    async fn next_raw(&mut self) -> Result<Option<Value>, FeedError>;

    /// Tear down the subscription. Best-effort: callers ignore failures, and
    /// calling it more than once must be harmless.
    async fn unsubscribe(&mut self);
}
