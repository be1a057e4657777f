//! txp-config
//!
//! Environment-driven run configuration. All parsing lives in pure functions
//! over strings so it is testable without touching the process environment;
//! `RunConfig::from_env` is the thin wrapper the binary calls after its
//! dotenv bootstrap.
//!
//! Variables:
//! - `TXP_SOURCES`          comma-separated `label=url` list; the URL scheme
//!   selects the transport (`ws`/`wss` subscription, `http`/`https` polling)
//! - `TXP_CONTRACT_ADDR`    contract address the filter is scoped to
//! - `TXP_EVENT_TOPIC`      optional event-signature topic (topics[0])
//! - `TXP_TARGET_COUNT`     per-source stop threshold (default 1000)
//! - `TXP_QUORUM`           warm-up gate quorum (default 1 = always open)
//! - `TXP_POLL_INTERVAL_MS` HTTP polling interval (default 2000)
//! - `TXP_MODE`             `keyed` (default) or `flat`

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_COUNT: usize = 1000;
pub const DEFAULT_QUORUM: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Comparison strategy for the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Bucket by block number, compare per-block sets.
    Keyed,
    /// No correlation key; compare overlapping hash ranges.
    Flat,
}

/// Transport a source endpoint speaks, derived from its URL scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    WebSocket,
    HttpPoll,
}

/// One configured upstream source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub label: String,
    pub url: String,
    pub transport: Transport,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub sources: Vec<SourceEndpoint>,
    pub contract_addr: String,
    pub event_topic: Option<String>,
    pub target_count: usize,
    pub quorum: usize,
    pub poll_interval_ms: u64,
    pub mode: RunMode,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        let sources = parse_sources(
            &std::env::var("TXP_SOURCES").context("TXP_SOURCES is required (label=url,...)")?,
        )?;
        let contract_addr = std::env::var("TXP_CONTRACT_ADDR")
            .context("TXP_CONTRACT_ADDR is required")?
            .trim()
            .to_string();
        if contract_addr.is_empty() {
            bail!("TXP_CONTRACT_ADDR must not be empty");
        }

        let event_topic = std::env::var("TXP_EVENT_TOPIC")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            sources,
            contract_addr,
            event_topic,
            target_count: env_parsed("TXP_TARGET_COUNT", DEFAULT_TARGET_COUNT)?,
            quorum: env_parsed("TXP_QUORUM", DEFAULT_QUORUM)?,
            poll_interval_ms: env_parsed("TXP_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            mode: match std::env::var("TXP_MODE") {
                Ok(raw) => parse_mode(&raw)?,
                Err(_) => RunMode::Keyed,
            },
        })
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is not a valid number: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Parse `label=url,label=url`. At least two sources, unique labels, and a
/// recognizable transport scheme per URL.
pub fn parse_sources(raw: &str) -> Result<Vec<SourceEndpoint>> {
    let mut sources = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (label, url) = part
            .split_once('=')
            .with_context(|| format!("source entry {part:?} is not label=url"))?;
        let label = label.trim();
        let url = url.trim();
        if label.is_empty() || url.is_empty() {
            bail!("source entry {part:?} has an empty label or url");
        }
        if sources.iter().any(|s: &SourceEndpoint| s.label == label) {
            bail!("duplicate source label {label:?}");
        }
        sources.push(SourceEndpoint {
            label: label.to_string(),
            url: url.to_string(),
            transport: transport_for_url(url)?,
        });
    }
    if sources.len() < 2 {
        bail!("need at least two sources to compare, got {}", sources.len());
    }
    Ok(sources)
}

fn transport_for_url(url: &str) -> Result<Transport> {
    let scheme = url.split("://").next().unwrap_or_default();
    match scheme {
        "ws" | "wss" => Ok(Transport::WebSocket),
        "http" | "https" => Ok(Transport::HttpPoll),
        other => bail!("unsupported url scheme {other:?} in {url:?}"),
    }
}

pub fn parse_mode(raw: &str) -> Result<RunMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "keyed" => Ok(RunMode::Keyed),
        "flat" => Ok(RunMode::Flat),
        other => bail!("TXP_MODE must be 'keyed' or 'flat', got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_transport_sources() {
        let sources = parse_sources(
            "infura-ws=wss://mainnet.example/ws/v3/key, alchemy-http=https://eth.example/v2/key",
        )
        .unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].label, "infura-ws");
        assert_eq!(sources[0].transport, Transport::WebSocket);
        assert_eq!(sources[1].transport, Transport::HttpPoll);
    }

    #[test]
    fn rejects_single_source() {
        assert!(parse_sources("only=wss://example").is_err());
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = parse_sources("a=wss://one,a=wss://two").unwrap_err();
        assert!(err.to_string().contains("duplicate source label"));
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(parse_sources("a=wss://one,b=ftp://two").is_err());
    }

    #[test]
    fn rejects_entry_without_equals() {
        assert!(parse_sources("a=wss://one,justaurl").is_err());
    }

    #[test]
    fn parses_modes() {
        assert_eq!(parse_mode("keyed").unwrap(), RunMode::Keyed);
        assert_eq!(parse_mode(" FLAT ").unwrap(), RunMode::Flat);
        assert!(parse_mode("other").is_err());
    }
}
