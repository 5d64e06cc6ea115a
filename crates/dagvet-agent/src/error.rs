use std::time::Duration;

use dagvet_protocol::ProtocolError;
use dagvet_store::StoreError;
use dagvet_types::Cid;
use thiserror::Error;

/// Failure writing to the host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("host channel closed")]
    Closed,

    #[error("host rejected message: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A second `start` arrived after the tip was already set.
    #[error("agent already started at {tip}")]
    AlreadyStarted { tip: Cid },

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation timed out after {0:?}")]
    Timeout(Duration),

    /// The agent went quiet without sending `finished`.
    #[error("no verdict: {reason}")]
    NoVerdict { reason: String },
}

pub type AgentResult<T> = Result<T, AgentError>;
