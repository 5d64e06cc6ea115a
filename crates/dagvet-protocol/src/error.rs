use dagvet_codec::{DecodeError, EncodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The outer `{type, payload}` map is missing or malformed.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The payload decoded but does not have the shape its type requires.
    #[error("invalid {type_tag} message: {reason}")]
    InvalidMessage { type_tag: String, reason: String },

    #[error("unexpected message type: expected {expected}, found {found}")]
    UnexpectedType { expected: String, found: String },
}

impl ProtocolError {
    pub(crate) fn invalid(type_tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            type_tag: type_tag.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
