//! txp-core
//!
//! Shared value types for the feed-parity workspace. Everything here is a
//! plain comparable value: no IO, no clock, no upstream types leak in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one (provider, transport, client) combination under comparison.
///
/// The set of SourceIds is fixed at startup and forms the comparison
/// universe. Deterministic ordering for tests/logs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash in canonical form: lowercase hex, `0x` prefix preserved.
///
/// Canonicalization happens in the constructor so that the derived `Ord` is
/// a total lexicographic order over the canonical string — "first"/"last"
/// and range slicing in the flat comparison are reproducible.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One normalized event observation as submitted by a source listener.
///
/// `block` is the correlation key; it is `None` for feeds that cannot
/// attribute events to a block (the flat comparison path).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub source: SourceId,
    pub block: Option<u64>,
    pub tx_hash: TxHash,
}

impl EventRecord {
    pub fn new(source: SourceId, block: Option<u64>, tx_hash: TxHash) -> Self {
        Self {
            source,
            block,
            tx_hash,
        }
    }
}
