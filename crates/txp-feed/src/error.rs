use std::fmt;

/// Errors a feed or listener may produce.
///
/// Only `Malformed` is recoverable (the listener drops the payload and keeps
/// collecting); everything else aborts the run.
#[derive(Debug)]
pub enum FeedError {
    /// Connection setup or mid-stream transport failure.
    Transport(String),
    /// The upstream JSON-RPC endpoint returned an error object.
    Rpc { code: Option<i64>, message: String },
    /// A payload was received but is missing expected fields.
    Malformed(String),
    /// A required configuration value is missing or invalid.
    Config(String),
}

impl FeedError {
    /// Malformed payloads are dropped at the listener boundary; all other
    /// variants terminate the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FeedError::Malformed(_))
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Transport(msg) => write!(f, "transport error: {msg}"),
            FeedError::Rpc {
                code: Some(c),
                message,
            } => write!(f, "rpc error code={c}: {message}"),
            FeedError::Rpc {
                code: None,
                message,
            } => write!(f, "rpc error: {message}"),
            FeedError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            FeedError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}
