//! txp-feed
//!
//! Upstream feed boundary: the opaque asynchronous producers the engine
//! compares, and the listener loop that normalizes their payloads into the
//! shared accumulator.
//!
//! Boundary rules:
//! - Strict decode at the edge: a payload missing expected fields is
//!   MalformedPayload — logged and dropped, never fatal, never counted.
//! - Transport failure anywhere is fatal to the whole run (no retry here;
//!   retry is upstream policy).
//! - A listener completes or fails exactly once and unsubscribes best-effort
//!   once its source hits the target count.

mod decode;
mod error;
mod feed;
mod http_poll;
mod listener;
mod ws;

pub use decode::decode_log;
pub use error::FeedError;
pub use feed::{EventFeed, EventFilter};
pub use http_poll::HttpPollFeed;
pub use listener::{run_listener, ListenerSummary, SharedAccumulator};
pub use ws::WsFeed;
