//! Strict payload decode — the fail-closed step at the listener boundary.
//!
//! Upstream clients disagree on payload shape (hex strings vs numbers,
//! field casing); the decode normalizes all of them into an [`EventRecord`]
//! attributed to the submitting source, or rejects the payload as malformed.
//! Undefined fields never propagate past this point.

use serde_json::Value;
use txp_core::{EventRecord, SourceId, TxHash};

use crate::error::FeedError;

/// Decode a raw log payload into a normalized record for `source`.
///
/// `transactionHash` is required. `blockNumber` is optional (flat feeds) but
/// must parse when present — a present-but-garbled block is malformed, not
/// silently keyless.
pub fn decode_log(source: &SourceId, payload: &Value) -> Result<EventRecord, FeedError> {
    let tx_hash = payload
        .get("transactionHash")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(TxHash::new)
        .ok_or_else(|| FeedError::Malformed("missing transactionHash".to_string()))?;

    let block = match payload.get("blockNumber") {
        None | Some(Value::Null) => None,
        Some(v) => Some(decode_quantity(v)?),
    };

    Ok(EventRecord::new(source.clone(), block, tx_hash))
}

/// Ethereum QUANTITY: hex string (`"0x10"`) from JSON-RPC, plain number from
/// some client libraries.
pub(crate) fn decode_quantity(v: &Value) -> Result<u64, FeedError> {
    if let Some(n) = v.as_u64() {
        return Ok(n);
    }
    if let Some(s) = v.as_str() {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if let Ok(n) = u64::from_str_radix(digits, 16) {
            return Ok(n);
        }
    }
    Err(FeedError::Malformed(format!("unparseable blockNumber: {v}")))
}
